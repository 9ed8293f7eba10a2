//! Draw-list scene builder: the renderer adapter contract.
//!
//! A [`Scene`] is a pure function of the current frame, the active-event
//! set, the calibration, the viewport, and the display toggles. A drawing
//! backend maps the primitives to pixels in struct order, which encodes the
//! fixed z-order: map background, grenade trajectories, grenade/fire
//! effects, bomb indicator, kill lines, trails, player markers (topmost, so
//! they stay clickable).
//!
//! Effect particle patterns are keyed by event id through a seeded RNG, so
//! re-rendering the same tick produces an identical scene.

use nalgebra::Point2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::models::events::{EventKind, GrenadeKind, ReplayEvent};
use crate::models::frame::{PlayerState, Team};
use crate::models::round::RoundData;
use crate::render::toggles::DisplayToggles;
use crate::render::transform::{
    apply_viewport, world_length_to_canvas, world_to_canvas, CanvasPoint, CanvasSize,
};
use crate::render::viewport::Viewport;
use crate::replay::visibility::{resolve_active, ActiveEvent, BombPhase, LifecycleStage};

pub const PLAYER_MARKER_RADIUS: f32 = 8.0;
pub const VIEW_CONE_LENGTH: f32 = 26.0;
/// Screen-space pick radius for player hit-testing.
pub const HIT_TEST_RADIUS: f32 = 12.0;

// Effect radii in world units.
const SMOKE_RADIUS_WU: f32 = 144.0;
const MOLOTOV_RADIUS_WU: f32 = 120.0;
const HE_RADIUS_WU: f32 = 60.0;
const FLASH_RADIUS_WU: f32 = 48.0;
const DECOY_RADIUS_WU: f32 = 32.0;

/// The whole-surface affine the backend applies once before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl From<Viewport> for SurfaceTransform {
    fn from(vp: Viewport) -> SurfaceTransform {
        SurfaceTransform { scale: vp.scale, offset_x: vp.offset_x, offset_y: vp.offset_y }
    }
}

/// Bottom layer: which radar image to draw, stretched to the canvas.
#[derive(Debug, Clone, Serialize)]
pub struct Background {
    pub map_name: String,
    pub size: CanvasSize,
}

/// Deterministic particle offset relative to its effect center.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Particle {
    pub dx: f32,
    pub dy: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrenadeEffect {
    pub event_id: u32,
    pub grenade: GrenadeKind,
    pub center: CanvasPoint,
    pub radius: f32,
    pub alpha: f32,
    /// End-of-life marker (smoke/fire dissipating).
    pub dissipating: bool,
    pub particles: Vec<Particle>,
}

/// Throw-origin to detonation-point line for utility review.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryLine {
    pub event_id: u32,
    pub grenade: GrenadeKind,
    pub from: CanvasPoint,
    pub to: CanvasPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BombIndicatorState {
    Planted,
    Defused,
    Exploded,
}

#[derive(Debug, Clone, Serialize)]
pub struct BombIndicator {
    pub pos: CanvasPoint,
    pub state: BombIndicatorState,
    /// Deterministic blink intensity for the planted state.
    pub pulse_alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct KillLine {
    pub event_id: u32,
    pub from: CanvasPoint,
    pub to: CanvasPoint,
    pub attacker_team: Team,
    pub weapon: String,
    pub headshot: bool,
    pub alpha: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrailPolyline {
    pub player_id: u64,
    pub team: Team,
    /// Oldest first; the current position is the last point.
    pub points: Vec<CanvasPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerMarker {
    pub id: u64,
    pub team: Team,
    pub pos: CanvasPoint,
    /// Facing in canvas space (degrees, clockwise from +X since canvas Y
    /// grows down).
    pub view_angle: f32,
    /// View-cone reach in canvas pixels; zero for dead players (no cone).
    pub cone_length: f32,
    pub radius: f32,
    pub is_alive: bool,
    pub is_ducking: bool,
    pub is_walking: bool,
    /// White overlay intensity 0..1 for flashed players.
    pub flash_overlay: f32,
    /// Label, present only when names are toggled on and the player lives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Health 0..100, present only when health bars are toggled on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<u8>,
    pub has_bomb: bool,
    pub has_defuse_kit: bool,
}

/// One paintable frame, in draw order.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub tick: u64,
    pub canvas: CanvasSize,
    pub transform: SurfaceTransform,
    pub background: Background,
    pub trajectories: Vec<TrajectoryLine>,
    pub effects: Vec<GrenadeEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bomb: Option<BombIndicator>,
    pub kill_lines: Vec<KillLine>,
    pub trails: Vec<TrailPolyline>,
    pub players: Vec<PlayerMarker>,
}

impl Scene {
    /// Resolve a screen-space click to the player under the cursor, nearest
    /// first. Inverts the surface transform implicitly by comparing in
    /// screen space.
    pub fn hit_test_player(&self, screen_x: f32, screen_y: f32) -> Option<u64> {
        let viewport = Viewport {
            scale: self.transform.scale,
            offset_x: self.transform.offset_x,
            offset_y: self.transform.offset_y,
        };
        let click = Point2::new(screen_x, screen_y);
        self.players
            .iter()
            .map(|p| {
                let screen_pos = apply_viewport(p.pos, &viewport);
                (p.id, (screen_pos - click).norm())
            })
            .filter(|(_, dist)| *dist <= HIT_TEST_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

/// Build the draw list for one paint.
pub fn build(
    round: &RoundData,
    frame_index: usize,
    current_tick: u64,
    viewport: Viewport,
    toggles: &DisplayToggles,
    canvas: CanvasSize,
) -> Scene {
    let toggles = toggles.sanitized();
    let cal = round.calibration();
    let frame_index = frame_index.min(round.frame_count() - 1);
    let frame = &round.frames()[frame_index];

    let active = resolve_active(
        round.events(),
        round.metadata().effective_tick_rate(),
        current_tick,
        (&toggles).into(),
    );

    let mut trajectories = Vec::new();
    let mut effects = Vec::new();
    let mut kill_lines = Vec::new();

    for entry in &active.events {
        match entry.event.kind() {
            EventKind::Kill => {
                if let Some((from, to)) = entry.event.kill_line() {
                    if let ReplayEvent::Kill { base, attacker_team, weapon, headshot, .. } =
                        entry.event
                    {
                        kill_lines.push(KillLine {
                            event_id: base.id,
                            from: world_to_canvas(from.x, from.y, cal, canvas),
                            to: world_to_canvas(to.x, to.y, cal, canvas),
                            attacker_team: *attacker_team,
                            weapon: weapon.clone(),
                            headshot: *headshot,
                            alpha: fade_alpha(entry),
                        });
                    }
                }
            }
            EventKind::GrenadeThrown => {
                if toggles.show_trajectories {
                    if let ReplayEvent::GrenadeThrown {
                        base,
                        grenade,
                        origin,
                        target: Some(target),
                        ..
                    } = entry.event
                    {
                        trajectories.push(TrajectoryLine {
                            event_id: base.id,
                            grenade: *grenade,
                            from: world_to_canvas(origin.x, origin.y, cal, canvas),
                            to: world_to_canvas(target.x, target.y, cal, canvas),
                        });
                    }
                }
            }
            kind if kind.is_grenade() => {
                effects.push(grenade_effect(entry, &toggles, cal, canvas));
            }
            _ => {}
        }
    }

    let bomb = match active.bomb {
        BombPhase::Clear => None,
        BombPhase::Planted { elapsed_ticks, pos, .. } => Some(BombIndicator {
            pos: world_to_canvas(pos.x, pos.y, cal, canvas),
            state: BombIndicatorState::Planted,
            pulse_alpha: planted_pulse(elapsed_ticks),
        }),
        BombPhase::Defused { pos, .. } => Some(BombIndicator {
            pos: world_to_canvas(pos.x, pos.y, cal, canvas),
            state: BombIndicatorState::Defused,
            pulse_alpha: 1.0,
        }),
        BombPhase::Exploded { pos, .. } => Some(BombIndicator {
            pos: world_to_canvas(pos.x, pos.y, cal, canvas),
            state: BombIndicatorState::Exploded,
            pulse_alpha: 1.0,
        }),
    };

    let trails = if toggles.show_trails {
        build_trails(round, frame_index, toggles.trail_length as usize, canvas)
    } else {
        Vec::new()
    };

    let players = frame.players.iter().map(|p| player_marker(p, &toggles, round, canvas)).collect();

    Scene {
        tick: current_tick,
        canvas,
        transform: viewport.into(),
        background: Background { map_name: round.metadata().map_name.clone(), size: canvas },
        trajectories,
        effects,
        bomb,
        kill_lines,
        trails,
        players,
    }
}

/// Alpha envelope over the event's lifecycle: ramp in while spawning, hold,
/// then ramp out over the fading stage.
fn fade_alpha(entry: &ActiveEvent<'_>) -> f32 {
    match entry.stage {
        LifecycleStage::Spawning => match entry.window_ticks {
            Some(window) if window > 0 => {
                let spawn_ticks = (window as f32 * 0.1).max(1.0);
                (entry.elapsed_ticks as f32 / spawn_ticks).clamp(0.2, 1.0)
            }
            _ => 1.0,
        },
        LifecycleStage::Steady => 1.0,
        // fade() is the remaining-lifetime ratio; the fading stage covers
        // the last 30% of the window.
        LifecycleStage::Fading => (entry.fade() / 0.3).clamp(0.0, 1.0),
    }
}

fn effect_radius_wu(grenade: GrenadeKind) -> f32 {
    match grenade {
        GrenadeKind::Smoke => SMOKE_RADIUS_WU,
        GrenadeKind::Molotov => MOLOTOV_RADIUS_WU,
        GrenadeKind::HeGrenade => HE_RADIUS_WU,
        GrenadeKind::Flashbang => FLASH_RADIUS_WU,
        GrenadeKind::Decoy | GrenadeKind::Unknown => DECOY_RADIUS_WU,
    }
}

fn grenade_effect(
    entry: &ActiveEvent<'_>,
    toggles: &DisplayToggles,
    cal: &crate::models::calibration::MapCalibration,
    canvas: CanvasSize,
) -> GrenadeEffect {
    let event = entry.event;
    let grenade = event.grenade_kind().unwrap_or(GrenadeKind::Unknown);
    let pos = event.pos();
    let dissipating = event.kind().is_grenade_end();
    let radius = world_length_to_canvas(effect_radius_wu(grenade), cal, canvas);

    let alpha = fade_alpha(entry) * if dissipating { 0.35 } else { 1.0 };

    // Only the area effects get a particle pattern.
    let particles = match grenade {
        GrenadeKind::Smoke | GrenadeKind::Molotov => {
            effect_particles(event.id(), toggles.fire_quality.particle_count(), radius)
        }
        _ => Vec::new(),
    };

    GrenadeEffect {
        event_id: event.id(),
        grenade,
        center: world_to_canvas(pos.x, pos.y, cal, canvas),
        radius,
        alpha,
        dissipating,
        particles,
    }
}

/// Particle offsets seeded by the event id: identical across repeated
/// renders of the same tick.
fn effect_particles(event_id: u32, count: usize, radius: f32) -> Vec<Particle> {
    let mut rng = ChaCha8Rng::seed_from_u64(fxhash::hash64(&event_id));
    (0..count)
        .map(|_| {
            let r = radius * rng.gen::<f32>().sqrt();
            let theta = rng.gen::<f32>() * std::f32::consts::TAU;
            Particle {
                dx: r * theta.cos(),
                dy: r * theta.sin(),
                size: 2.0 + rng.gen::<f32>() * 3.0,
            }
        })
        .collect()
}

fn planted_pulse(elapsed_ticks: u64) -> f32 {
    // Deterministic blink, ~1.2 Hz at 64 ticks/s.
    0.5 + 0.5 * ((elapsed_ticks as f32) * 0.12).sin()
}

fn build_trails(
    round: &RoundData,
    frame_index: usize,
    trail_length: usize,
    canvas: CanvasSize,
) -> Vec<TrailPolyline> {
    let cal = round.calibration();
    let start = frame_index.saturating_sub(trail_length);
    let window = &round.frames()[start..=frame_index];
    let current = &round.frames()[frame_index];

    current
        .players
        .iter()
        .filter(|p| p.is_alive)
        .map(|p| TrailPolyline {
            player_id: p.id,
            team: p.team,
            points: window
                .iter()
                .filter_map(|f| f.player(p.id))
                .filter(|s| s.is_alive)
                .map(|s| world_to_canvas(s.x, s.y, cal, canvas))
                .collect(),
        })
        .filter(|trail| trail.points.len() >= 2)
        .collect()
}

fn player_marker(
    player: &PlayerState,
    toggles: &DisplayToggles,
    round: &RoundData,
    canvas: CanvasSize,
) -> PlayerMarker {
    let cal = round.calibration();
    let alive = player.is_alive;
    PlayerMarker {
        id: player.id,
        team: player.team,
        pos: world_to_canvas(player.x, player.y, cal, canvas),
        // World yaw is counter-clockwise; canvas Y grows down, so negate.
        view_angle: -player.view_angle,
        cone_length: if alive { VIEW_CONE_LENGTH } else { 0.0 },
        radius: PLAYER_MARKER_RADIUS,
        is_alive: alive,
        is_ducking: alive && player.is_ducking,
        is_walking: alive && player.is_walking,
        flash_overlay: if alive { player.normalized_flash() } else { 0.0 },
        name: (alive && toggles.show_player_names).then(|| player.name.clone()),
        health: (alive && toggles.show_health_bars).then_some(player.health),
        // Equipment badges never show on dead players, whatever the data says.
        has_bomb: alive && player.has_bomb,
        has_defuse_kit: alive && player.has_defuse_kit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calibration::MapCalibration;
    use crate::models::gen::{
        bomb_plant_event, grenade_thrown_event, invalid_kill_event, kill_event,
        molotov_start_event, sample_frames, sample_metadata, sample_round, smoke_start_event,
    };
    use crate::models::round::RoundData;
    use crate::render::toggles::FireQuality;

    const CANVAS: CanvasSize = CanvasSize { width: 1024.0, height: 1024.0 };

    fn scene_at(round: &RoundData, tick: u64, toggles: &DisplayToggles) -> Scene {
        let index = round.frame_index_at_tick(tick);
        build(round, index, tick, Viewport::default(), toggles, CANVAS)
    }

    #[test]
    fn test_layer_population_and_zorder_fields() {
        let round = sample_round();
        let toggles = DisplayToggles::default();

        // Tick 200: kill at 150 still active (3 s window), smoke active.
        let scene = scene_at(&round, 210, &toggles);
        assert_eq!(scene.kill_lines.len(), 1);
        assert_eq!(scene.effects.len(), 1);
        assert_eq!(scene.players.len(), 4);
        assert_eq!(scene.background.map_name, "de_dust2");
        assert!(scene.bomb.is_none());

        // Tick 310: plant active.
        let scene = scene_at(&round, 310, &toggles);
        let bomb = scene.bomb.expect("bomb indicator");
        assert_eq!(bomb.state, BombIndicatorState::Planted);
    }

    #[test]
    fn test_toggles_gate_layers() {
        let round = sample_round();
        let toggles = DisplayToggles {
            show_kill_lines: false,
            show_grenades: false,
            show_player_names: false,
            show_health_bars: false,
            ..Default::default()
        };
        let scene = scene_at(&round, 210, &toggles);
        assert!(scene.kill_lines.is_empty());
        assert!(scene.effects.is_empty());
        assert!(scene.players.iter().all(|p| p.name.is_none() && p.health.is_none()));
    }

    #[test]
    fn test_dead_players_suppress_equipment_and_labels() {
        let metadata = sample_metadata(100, 200, 64);
        let mut frames = sample_frames(100, 4, 8);
        for frame in &mut frames {
            let p = &mut frame.players[0];
            p.is_alive = false;
            p.health = 0;
            p.has_bomb = true;
            p.has_defuse_kit = true;
            p.flash_intensity = 255.0;
        }
        let round =
            RoundData::new(metadata, MapCalibration::fallback(), frames, Vec::new()).unwrap();
        let scene = scene_at(&round, 110, &DisplayToggles::default());

        let dead = scene.players.iter().find(|p| !p.is_alive).unwrap();
        assert_eq!(dead.cone_length, 0.0);
        assert!(!dead.has_bomb);
        assert!(!dead.has_defuse_kit);
        assert!(dead.name.is_none());
        assert!(dead.health.is_none());
        assert_eq!(dead.flash_overlay, 0.0);
    }

    #[test]
    fn test_invalid_kill_never_drawn() {
        let metadata = sample_metadata(100, 2000, 64);
        let frames = sample_frames(100, 10, 8);
        let round = RoundData::new(
            metadata,
            MapCalibration::fallback(),
            frames,
            vec![invalid_kill_event(1, 120)],
        )
        .unwrap();
        let scene = scene_at(&round, 125, &DisplayToggles::default());
        assert!(scene.kill_lines.is_empty());
    }

    #[test]
    fn test_deterministic_effects() {
        let round = sample_round();
        let toggles = DisplayToggles::default();
        let a = scene_at(&round, 210, &toggles);
        let b = scene_at(&round, 210, &toggles);

        let pa = &a.effects[0].particles;
        let pb = &b.effects[0].particles;
        assert_eq!(pa.len(), pb.len());
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert_eq!(x.dx, y.dx);
            assert_eq!(x.dy, y.dy);
            assert_eq!(x.size, y.size);
        }
    }

    #[test]
    fn test_fire_quality_scales_particles() {
        let metadata = sample_metadata(100, 2000, 64);
        let frames = sample_frames(100, 10, 8);
        let round = RoundData::new(
            metadata,
            MapCalibration::fallback(),
            frames,
            vec![molotov_start_event(1, 120)],
        )
        .unwrap();

        let low = DisplayToggles { fire_quality: FireQuality::Low, ..Default::default() };
        let high = DisplayToggles { fire_quality: FireQuality::High, ..Default::default() };
        let scene_low = scene_at(&round, 125, &low);
        let scene_high = scene_at(&round, 125, &high);
        assert_eq!(scene_low.effects[0].particles.len(), 8);
        assert_eq!(scene_high.effects[0].particles.len(), 32);
    }

    #[test]
    fn test_trajectories_gated_by_toggle() {
        let metadata = sample_metadata(100, 2000, 64);
        let frames = sample_frames(100, 10, 8);
        let round = RoundData::new(
            metadata,
            MapCalibration::fallback(),
            frames,
            vec![grenade_thrown_event(1, 120, GrenadeKind::Smoke)],
        )
        .unwrap();

        let off = scene_at(&round, 125, &DisplayToggles::default());
        assert!(off.trajectories.is_empty());

        let on = DisplayToggles { show_trajectories: true, ..Default::default() };
        let scene = scene_at(&round, 125, &on);
        assert_eq!(scene.trajectories.len(), 1);
    }

    #[test]
    fn test_trails_follow_frame_history() {
        let round = sample_round();
        let toggles =
            DisplayToggles { show_trails: true, trail_length: 10, ..Default::default() };
        let scene = scene_at(&round, 300, &toggles);
        assert!(!scene.trails.is_empty());
        for trail in &scene.trails {
            assert!(trail.points.len() >= 2);
            assert!(trail.points.len() <= 11);
        }
    }

    #[test]
    fn test_hit_test_with_viewport() {
        let round = sample_round();
        let index = round.frame_index_at_tick(150);
        let viewport = Viewport { scale: 2.0, offset_x: -50.0, offset_y: 30.0 };
        let scene =
            build(&round, index, 150, viewport, &DisplayToggles::default(), CANVAS);

        let target = &scene.players[0];
        let screen = apply_viewport(target.pos, &viewport);
        assert_eq!(scene.hit_test_player(screen.x, screen.y), Some(target.id));

        // Far away from everyone: no hit.
        assert_eq!(scene.hit_test_player(-10_000.0, -10_000.0), None);
    }

    #[test]
    fn test_smoke_end_renders_dissipation() {
        let metadata = sample_metadata(100, 5000, 64);
        let frames = sample_frames(100, 10, 8);
        let end_event = crate::models::events::ReplayEvent::SmokeEnd {
            base: crate::models::events::EventBase { id: 9, tick: 150 },
            pos: crate::models::events::WorldPos::new(300.0, 400.0),
            entity_id: None,
        };
        let round =
            RoundData::new(metadata, MapCalibration::fallback(), frames, vec![end_event]).unwrap();
        let scene = scene_at(&round, 160, &DisplayToggles::default());
        assert_eq!(scene.effects.len(), 1);
        assert!(scene.effects[0].dissipating);
        assert!(scene.effects[0].alpha < 0.5);
    }

    #[test]
    fn test_uses_sample_events_helpers() {
        // Keep shared fixtures honest: plant then kill resolve together.
        let metadata = sample_metadata(100, 5000, 64);
        let frames = sample_frames(100, 20, 8);
        let round = RoundData::new(
            metadata,
            MapCalibration::fallback(),
            frames,
            vec![kill_event(1, 150), smoke_start_event(2, 150), bomb_plant_event(3, 150)],
        )
        .unwrap();
        let scene = scene_at(&round, 160, &DisplayToggles::default());
        assert_eq!(scene.kill_lines.len(), 1);
        assert_eq!(scene.effects.len(), 1);
        assert!(scene.bomb.is_some());
    }
}
