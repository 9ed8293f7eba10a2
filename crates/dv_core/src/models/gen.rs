//! Round-data generator utilities used in tests (fixtures + proptest).

use crate::models::calibration::MapCalibration;
use crate::models::events::{BombSite, EventBase, GrenadeKind, ReplayEvent, WorldPos};
use crate::models::frame::{Frame, PlayerState, Team};
use crate::models::round::{RoundData, RoundMetadata, TeamScore, WinReason};
use crate::provider::{DemoDocument, DemoMetadata, RoundInfo, RoundPayload};

#[cfg(any(test, feature = "proptest"))]
use proptest::prelude::*;

// ============================================================================
// Plain fixture builders
// ============================================================================

pub fn sample_player(id: u64, team: Team, x: f32, y: f32) -> PlayerState {
    PlayerState {
        id,
        name: format!("player{}", id),
        team,
        x,
        y,
        view_angle: 90.0,
        velocity_x: 0.0,
        velocity_y: 0.0,
        is_alive: true,
        health: 100,
        armor: 100,
        has_helmet: true,
        active_weapon: Some("ak47".to_string()),
        ammo: Some(30),
        has_bomb: false,
        has_defuse_kit: false,
        money: 2900,
        flash_intensity: 0.0,
        is_ducking: false,
        is_walking: false,
    }
}

/// A 2v2 frame; positions drift with the tick so trails are non-degenerate.
pub fn sample_frame(tick: u64) -> Frame {
    let drift = (tick % 1000) as f32;
    let mut bomb_carrier = sample_player(1, Team::T, 200.0 + drift, 300.0);
    bomb_carrier.has_bomb = true;
    Frame {
        tick,
        players: vec![
            bomb_carrier,
            sample_player(2, Team::T, 250.0 + drift, 350.0),
            sample_player(3, Team::Ct, 800.0 - drift, 900.0),
            sample_player(4, Team::Ct, 850.0 - drift, 950.0),
        ],
    }
}

pub fn sample_frames(start_tick: u64, count: usize, stride: u64) -> Vec<Frame> {
    (0..count).map(|i| sample_frame(start_tick + i as u64 * stride)).collect()
}

pub fn sample_metadata(start_tick: u64, end_tick: u64, tick_rate: u32) -> RoundMetadata {
    RoundMetadata {
        round_number: 1,
        map_name: "de_dust2".to_string(),
        start_tick,
        end_tick,
        freeze_end_tick: None,
        tick_rate,
        team_ct: TeamScore { name: "Counter-Terrorists".to_string(), score: 0 },
        team_t: TeamScore { name: "Terrorists".to_string(), score: 1 },
        winner: Some(Team::T),
        win_reason: WinReason::BombExploded,
    }
}

pub fn kill_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::Kill {
        base: EventBase { id, tick },
        attacker_id: 1,
        victim_id: 3,
        attacker_team: Team::T,
        weapon: "ak47".to_string(),
        headshot: true,
        origin: WorldPos::new(200.0, 300.0),
        target: Some(WorldPos::new(800.0, 900.0)),
    }
}

/// Kill whose victim position is unknown (near-origin target).
pub fn invalid_kill_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::Kill {
        base: EventBase { id, tick },
        attacker_id: 2,
        victim_id: 4,
        attacker_team: Team::T,
        weapon: "deagle".to_string(),
        headshot: false,
        origin: WorldPos::new(0.3, -0.2),
        target: Some(WorldPos::new(0.0, 0.0)),
    }
}

pub fn smoke_start_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::SmokeStart {
        base: EventBase { id, tick },
        pos: WorldPos::new(300.0, 400.0),
        entity_id: Some(id),
    }
}

pub fn molotov_start_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::MolotovStart {
        base: EventBase { id, tick },
        pos: WorldPos::new(500.0, 600.0),
        entity_id: Some(id),
    }
}

pub fn grenade_thrown_event(id: u32, tick: u64, grenade: GrenadeKind) -> ReplayEvent {
    ReplayEvent::GrenadeThrown {
        base: EventBase { id, tick },
        thrower_id: 2,
        grenade,
        origin: WorldPos::new(250.0, 350.0),
        target: Some(WorldPos::new(300.0, 400.0)),
    }
}

pub fn bomb_plant_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::BombPlant {
        base: EventBase { id, tick },
        player_id: 1,
        site: Some(BombSite::A),
        pos: WorldPos::new(1100.0, 650.0),
    }
}

pub fn bomb_defuse_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::BombDefuse {
        base: EventBase { id, tick },
        player_id: 3,
        pos: WorldPos::new(1100.0, 650.0),
    }
}

pub fn bomb_explode_event(id: u32, tick: u64) -> ReplayEvent {
    ReplayEvent::BombExplode { base: EventBase { id, tick }, pos: WorldPos::new(1100.0, 650.0) }
}

/// Standard test round: tick rate 64, 40 frames at ticks 100, 108, ..., 412,
/// with a kill, a smoke, and a plant/defuse pair.
pub fn sample_round() -> RoundData {
    let frames = sample_frames(100, 40, 8);
    let metadata = sample_metadata(100, 412, 64);
    let events = vec![
        kill_event(1, 150),
        smoke_start_event(2, 200),
        bomb_plant_event(3, 300),
        bomb_defuse_event(4, 380),
    ];
    RoundData::new(metadata, MapCalibration::fallback(), frames, events).unwrap()
}

/// The same round as [`sample_round`], in provider-payload form.
pub fn sample_payload() -> RoundPayload {
    RoundPayload {
        metadata: sample_metadata(100, 412, 64),
        calibration: MapCalibration::fallback(),
        frames: sample_frames(100, 40, 8),
        events: vec![
            kill_event(1, 150),
            smoke_start_event(2, 200),
            bomb_plant_event(3, 300),
            bomb_defuse_event(4, 380),
        ],
    }
}

/// A two-round parsed-demo document. Round 1 (ticks 100..=900) carries
/// frames; round 2 is present in the index but unprocessed.
pub fn sample_document() -> DemoDocument {
    DemoDocument {
        metadata: DemoMetadata {
            demo_file_name: "match.dem".to_string(),
            map_name: "de_mirage".to_string(),
            tick_rate: 64,
            total_ticks: 2000,
            duration_seconds: 31.25,
            team1_name: "Alpha".to_string(),
            team2_name: "Bravo".to_string(),
            team1_score: 13,
            team2_score: 7,
            ..Default::default()
        },
        rounds: vec![
            RoundInfo {
                round_number: 1,
                start_tick: 100,
                end_tick: 900,
                freeze_end_tick: Some(150),
                winner_team: 2,
                end_reason_code: 9,
                ct_score: 0,
                t_score: 1,
                bomb_planted: false,
                bomb_plant_tick: None,
                bomb_defused: false,
                bomb_exploded: false,
            },
            RoundInfo {
                round_number: 2,
                start_tick: 1000,
                end_tick: 1900,
                freeze_end_tick: None,
                winner_team: 3,
                end_reason_code: 7,
                ct_score: 1,
                t_score: 1,
                bomb_planted: true,
                bomb_plant_tick: Some(1500),
                bomb_defused: true,
                bomb_exploded: false,
            },
        ],
        frames: sample_frames(100, 40, 8),
        events: vec![kill_event(1, 150), kill_event(2, 1200)],
    }
}

// ============================================================================
// Proptest strategies
// ============================================================================

#[cfg(any(test, feature = "proptest"))]
pub fn arb_world_pos() -> impl Strategy<Value = WorldPos> {
    (-4000.0f32..4000.0, -4000.0f32..4000.0).prop_map(|(x, y)| WorldPos::new(x, y))
}

#[cfg(any(test, feature = "proptest"))]
pub fn arb_team() -> impl Strategy<Value = Team> {
    prop_oneof![Just(Team::T), Just(Team::Ct)]
}

#[cfg(any(test, feature = "proptest"))]
pub fn arb_grenade_kind() -> impl Strategy<Value = GrenadeKind> {
    prop_oneof![
        Just(GrenadeKind::Smoke),
        Just(GrenadeKind::Flashbang),
        Just(GrenadeKind::HeGrenade),
        Just(GrenadeKind::Molotov),
        Just(GrenadeKind::Decoy),
    ]
}

#[cfg(any(test, feature = "proptest"))]
pub fn arb_replay_event() -> impl Strategy<Value = ReplayEvent> {
    let base = (0u32..10_000, 0u64..200_000).prop_map(|(id, tick)| EventBase { id, tick });
    prop_oneof![
        (base.clone(), arb_world_pos(), prop::option::of(arb_world_pos()), arb_team()).prop_map(
            |(base, origin, target, attacker_team)| ReplayEvent::Kill {
                base,
                attacker_id: 1,
                victim_id: 2,
                attacker_team,
                weapon: "ak47".to_string(),
                headshot: false,
                origin,
                target,
            }
        ),
        (base.clone(), arb_world_pos()).prop_map(|(base, pos)| ReplayEvent::SmokeStart {
            base,
            pos,
            entity_id: None,
        }),
        (base.clone(), arb_world_pos()).prop_map(|(base, pos)| ReplayEvent::HeExplode {
            base,
            pos,
        }),
        (base, arb_world_pos()).prop_map(|(base, pos)| ReplayEvent::BombPlant {
            base,
            player_id: 1,
            site: None,
            pos,
        }),
    ]
}
