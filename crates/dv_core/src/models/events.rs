//! Discrete round events: kills, bomb state changes, grenade lifecycles.
//!
//! Events are a tagged union over the closed kind set the parser emits, one
//! variant per kind with only the fields that kind guarantees. Consumers
//! match exhaustively instead of probing optional fields.

use serde::{Deserialize, Serialize};

use crate::models::frame::Team;

/// Kill targets whose magnitude is at or below this threshold carry no real
/// position: the parser writes near-origin coordinates when the victim
/// position was unknown. Such kills are suppressed from the drawable set.
pub const ORIGIN_EPSILON: f32 = 1.0;

/// A point on the world plane (map units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub fn new(x: f32, y: f32) -> WorldPos {
        WorldPos { x, y }
    }

    pub fn magnitude(&self) -> f32 {
        self.x.hypot(self.y)
    }

    /// True when the coordinates signal "position unknown" rather than an
    /// actual location at the map origin.
    pub fn is_near_origin(&self) -> bool {
        self.magnitude() <= ORIGIN_EPSILON
    }
}

/// Common event metadata. `id` is unique within a round; `tick` is the
/// absolute occurrence tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBase {
    pub id: u32,
    pub tick: u64,
}

/// Grenade sub-type. Unrecognized parser strings degrade to `Unknown`
/// rather than failing the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrenadeKind {
    Smoke,
    Flashbang,
    HeGrenade,
    Molotov,
    Decoy,
    Unknown,
}

impl GrenadeKind {
    /// Parse a grenade name, accepting the parser's aliases (`hegrenade`,
    /// `incendiary`). Anything unrecognized becomes `Unknown`.
    pub fn from_name(name: &str) -> GrenadeKind {
        match name {
            "smoke" => GrenadeKind::Smoke,
            "flashbang" => GrenadeKind::Flashbang,
            "he_grenade" | "hegrenade" => GrenadeKind::HeGrenade,
            "molotov" | "incendiary" => GrenadeKind::Molotov,
            "decoy" => GrenadeKind::Decoy,
            _ => GrenadeKind::Unknown,
        }
    }
}

impl<'de> serde::Deserialize<'de> for GrenadeKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<GrenadeKind, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(GrenadeKind::from_name(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BombSite {
    A,
    B,
}

impl BombSite {
    /// Parse the parser's free-form site field ("A", "BombsiteB", ...).
    pub fn from_site_str(s: &str) -> Option<BombSite> {
        match s.trim().chars().last()? {
            'a' | 'A' => Some(BombSite::A),
            'b' | 'B' => Some(BombSite::B),
            _ => None,
        }
    }
}

/// A discrete, timestamped occurrence within one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    Kill {
        base: EventBase,
        attacker_id: u64,
        victim_id: u64,
        attacker_team: Team,
        weapon: String,
        #[serde(default)]
        headshot: bool,
        /// Attacker position at the kill tick.
        origin: WorldPos,
        /// Victim position; absent or near-origin means unknown.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<WorldPos>,
    },
    BombPlant {
        base: EventBase,
        player_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        site: Option<BombSite>,
        pos: WorldPos,
    },
    BombDefuse {
        base: EventBase,
        player_id: u64,
        pos: WorldPos,
    },
    BombExplode {
        base: EventBase,
        pos: WorldPos,
    },
    GrenadeThrown {
        base: EventBase,
        thrower_id: u64,
        grenade: GrenadeKind,
        origin: WorldPos,
        /// Detonation point when the parser linked the projectile.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<WorldPos>,
    },
    SmokeStart {
        base: EventBase,
        pos: WorldPos,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<u32>,
    },
    SmokeEnd {
        base: EventBase,
        pos: WorldPos,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<u32>,
    },
    MolotovStart {
        base: EventBase,
        pos: WorldPos,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<u32>,
    },
    MolotovEnd {
        base: EventBase,
        pos: WorldPos,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<u32>,
    },
    HeExplode {
        base: EventBase,
        pos: WorldPos,
    },
    FlashEffect {
        base: EventBase,
        pos: WorldPos,
    },
    DecoyStart {
        base: EventBase,
        pos: WorldPos,
    },
}

/// Field-less mirror of [`ReplayEvent`] for filtering and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Kill,
    BombPlant,
    BombDefuse,
    BombExplode,
    GrenadeThrown,
    SmokeStart,
    SmokeEnd,
    MolotovStart,
    MolotovEnd,
    HeExplode,
    FlashEffect,
    DecoyStart,
}

impl EventKind {
    pub fn is_bomb(self) -> bool {
        matches!(self, EventKind::BombPlant | EventKind::BombDefuse | EventKind::BombExplode)
    }

    pub fn is_grenade(self) -> bool {
        matches!(
            self,
            EventKind::GrenadeThrown
                | EventKind::SmokeStart
                | EventKind::SmokeEnd
                | EventKind::MolotovStart
                | EventKind::MolotovEnd
                | EventKind::HeExplode
                | EventKind::FlashEffect
                | EventKind::DecoyStart
        )
    }

    /// True for end-of-life markers (dissipation visuals).
    pub fn is_grenade_end(self) -> bool {
        matches!(self, EventKind::SmokeEnd | EventKind::MolotovEnd)
    }
}

impl ReplayEvent {
    pub fn base(&self) -> EventBase {
        match self {
            ReplayEvent::Kill { base, .. }
            | ReplayEvent::BombPlant { base, .. }
            | ReplayEvent::BombDefuse { base, .. }
            | ReplayEvent::BombExplode { base, .. }
            | ReplayEvent::GrenadeThrown { base, .. }
            | ReplayEvent::SmokeStart { base, .. }
            | ReplayEvent::SmokeEnd { base, .. }
            | ReplayEvent::MolotovStart { base, .. }
            | ReplayEvent::MolotovEnd { base, .. }
            | ReplayEvent::HeExplode { base, .. }
            | ReplayEvent::FlashEffect { base, .. }
            | ReplayEvent::DecoyStart { base, .. } => *base,
        }
    }

    pub fn id(&self) -> u32 {
        self.base().id
    }

    pub fn tick(&self) -> u64 {
        self.base().tick
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ReplayEvent::Kill { .. } => EventKind::Kill,
            ReplayEvent::BombPlant { .. } => EventKind::BombPlant,
            ReplayEvent::BombDefuse { .. } => EventKind::BombDefuse,
            ReplayEvent::BombExplode { .. } => EventKind::BombExplode,
            ReplayEvent::GrenadeThrown { .. } => EventKind::GrenadeThrown,
            ReplayEvent::SmokeStart { .. } => EventKind::SmokeStart,
            ReplayEvent::SmokeEnd { .. } => EventKind::SmokeEnd,
            ReplayEvent::MolotovStart { .. } => EventKind::MolotovStart,
            ReplayEvent::MolotovEnd { .. } => EventKind::MolotovEnd,
            ReplayEvent::HeExplode { .. } => EventKind::HeExplode,
            ReplayEvent::FlashEffect { .. } => EventKind::FlashEffect,
            ReplayEvent::DecoyStart { .. } => EventKind::DecoyStart,
        }
    }

    /// The event's anchor position (actor position for kills and throws).
    pub fn pos(&self) -> WorldPos {
        match self {
            ReplayEvent::Kill { origin, .. } => *origin,
            ReplayEvent::BombPlant { pos, .. }
            | ReplayEvent::BombDefuse { pos, .. }
            | ReplayEvent::BombExplode { pos, .. }
            | ReplayEvent::SmokeStart { pos, .. }
            | ReplayEvent::SmokeEnd { pos, .. }
            | ReplayEvent::MolotovStart { pos, .. }
            | ReplayEvent::MolotovEnd { pos, .. }
            | ReplayEvent::HeExplode { pos, .. }
            | ReplayEvent::FlashEffect { pos, .. }
            | ReplayEvent::DecoyStart { pos, .. } => *pos,
            ReplayEvent::GrenadeThrown { origin, .. } => *origin,
        }
    }

    /// Grenade sub-type for grenade lifecycle events.
    pub fn grenade_kind(&self) -> Option<GrenadeKind> {
        match self {
            ReplayEvent::GrenadeThrown { grenade, .. } => Some(*grenade),
            ReplayEvent::SmokeStart { .. } | ReplayEvent::SmokeEnd { .. } => {
                Some(GrenadeKind::Smoke)
            }
            ReplayEvent::MolotovStart { .. } | ReplayEvent::MolotovEnd { .. } => {
                Some(GrenadeKind::Molotov)
            }
            ReplayEvent::HeExplode { .. } => Some(GrenadeKind::HeGrenade),
            ReplayEvent::FlashEffect { .. } => Some(GrenadeKind::Flashbang),
            ReplayEvent::DecoyStart { .. } => Some(GrenadeKind::Decoy),
            _ => None,
        }
    }

    /// Drawable kill-line endpoints, or `None` when the victim position is
    /// unknown (absent or near-origin target).
    pub fn kill_line(&self) -> Option<(WorldPos, WorldPos)> {
        match self {
            ReplayEvent::Kill { origin, target: Some(target), .. }
                if !target.is_near_origin() =>
            {
                Some((*origin, *target))
            }
            _ => None,
        }
    }
}

/// The round's ordered event list. Sorted ascending by tick on construction;
/// immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLedger {
    events: Vec<ReplayEvent>,
}

impl EventLedger {
    pub fn new(mut events: Vec<ReplayEvent>) -> EventLedger {
        // Stable sort keeps same-tick events in parser emission order.
        events.sort_by_key(|e| e.tick());
        EventLedger { events }
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events that have occurred at or before `tick` (visibility
    /// candidates). O(log n) boundary lookup into the sorted list.
    pub fn candidates_at(&self, tick: u64) -> &[ReplayEvent] {
        let end = self.events.partition_point(|e| e.tick() <= tick);
        &self.events[..end]
    }

    /// Events with `start <= tick <= end`.
    pub fn in_range(&self, start: u64, end: u64) -> &[ReplayEvent] {
        let lo = self.events.partition_point(|e| e.tick() < start);
        let hi = self.events.partition_point(|e| e.tick() <= end);
        &self.events[lo..hi]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplayEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gen::{kill_event, smoke_start_event};

    #[test]
    fn test_event_serde_tagging() {
        let event = kill_event(7, 1000);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"kill""#));

        let back: ReplayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_unknown_grenade_kind_degrades() {
        let json = r#"{
            "kind": "grenade_thrown",
            "base": { "id": 1, "tick": 500 },
            "thrower_id": 42,
            "grenade": "snowball",
            "origin": { "x": 1.0, "y": 2.0 }
        }"#;
        let event: ReplayEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.grenade_kind(), Some(GrenadeKind::Unknown));

        // Parser aliases resolve to the canonical kinds.
        assert_eq!(GrenadeKind::from_name("hegrenade"), GrenadeKind::HeGrenade);
        assert_eq!(GrenadeKind::from_name("incendiary"), GrenadeKind::Molotov);
    }

    #[test]
    fn test_kill_line_suppressed_near_origin() {
        let mut event = kill_event(1, 1000);
        if let ReplayEvent::Kill { target, .. } = &mut event {
            *target = Some(WorldPos::new(0.0, 0.0));
        }
        assert!(event.kill_line().is_none());

        if let ReplayEvent::Kill { target, .. } = &mut event {
            *target = None;
        }
        assert!(event.kill_line().is_none());

        if let ReplayEvent::Kill { target, .. } = &mut event {
            *target = Some(WorldPos::new(120.0, -340.0));
        }
        assert!(event.kill_line().is_some());
    }

    #[test]
    fn test_ledger_sorts_and_slices() {
        let ledger = EventLedger::new(vec![
            smoke_start_event(3, 900),
            kill_event(1, 100),
            kill_event(2, 500),
        ]);
        let ticks: Vec<u64> = ledger.iter().map(|e| e.tick()).collect();
        assert_eq!(ticks, vec![100, 500, 900]);

        assert_eq!(ledger.candidates_at(499).len(), 1);
        assert_eq!(ledger.candidates_at(500).len(), 2);
        assert_eq!(ledger.in_range(100, 500).len(), 2);
        assert_eq!(ledger.in_range(101, 499).len(), 0);
    }

    #[test]
    fn test_bomb_site_parsing() {
        assert_eq!(BombSite::from_site_str("A"), Some(BombSite::A));
        assert_eq!(BombSite::from_site_str("BombsiteB"), Some(BombSite::B));
        assert_eq!(BombSite::from_site_str(""), None);
    }
}
