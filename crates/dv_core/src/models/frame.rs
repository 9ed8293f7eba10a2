//! Per-tick player state snapshots.
//!
//! A `Frame` is one sampled snapshot of every connected player's state at an
//! absolute demo tick. Frames are sub-sampled from the full-rate demo at a
//! configurable stride, so consecutive ticks are not contiguous.

use serde::{Deserialize, Serialize};

/// The two sides of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    T,
    Ct,
}

impl Team {
    /// Map the demo parser's team numbers (2 = T, 3 = CT).
    pub fn from_team_num(num: u8) -> Option<Team> {
        match num {
            2 => Some(Team::T),
            3 => Some(Team::Ct),
            _ => None,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::T => Team::Ct,
            Team::Ct => Team::T,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Team::T => "T",
            Team::Ct => "CT",
        }
    }
}

/// One player's sampled state at a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Stable per-player identifier (SteamID64).
    pub id: u64,
    pub name: String,
    pub team: Team,

    // Kinematics. `view_angle` is the horizontal facing (world yaw, degrees);
    // velocity is used only for walk/run visual classification, not physics.
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub view_angle: f32,
    #[serde(default)]
    pub velocity_x: f32,
    #[serde(default)]
    pub velocity_y: f32,

    pub is_alive: bool,
    pub health: u8,
    #[serde(default)]
    pub armor: u8,
    #[serde(default)]
    pub has_helmet: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_weapon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo: Option<u16>,
    #[serde(default)]
    pub has_bomb: bool,
    #[serde(default)]
    pub has_defuse_kit: bool,
    #[serde(default)]
    pub money: i32,

    /// Flash blindness. Sources emit either a normalized 0..1 value or the
    /// raw 0..255 overlay alpha; use [`PlayerState::normalized_flash`].
    #[serde(default)]
    pub flash_intensity: f32,
    #[serde(default)]
    pub is_ducking: bool,
    #[serde(default)]
    pub is_walking: bool,
}

impl PlayerState {
    /// Planar speed in world units per second.
    pub fn speed(&self) -> f32 {
        self.velocity_x.hypot(self.velocity_y)
    }

    /// Flash blindness normalized to 0..1 regardless of source scale.
    pub fn normalized_flash(&self) -> f32 {
        if self.flash_intensity > 1.0 {
            (self.flash_intensity / 255.0).clamp(0.0, 1.0)
        } else {
            self.flash_intensity.clamp(0.0, 1.0)
        }
    }
}

/// One sampled snapshot of round state at an absolute demo tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub players: Vec<PlayerState>,
}

impl Frame {
    pub fn player(&self, id: u64) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The living bomb carrier, if any. At most one player may carry the
    /// bomb; extra carriers are a data anomaly the round loader logs.
    pub fn bomb_carrier(&self) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.is_alive && p.has_bomb)
    }

    pub fn alive_count(&self, team: Team) -> usize {
        self.players.iter().filter(|p| p.team == team && p.is_alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gen::sample_player;

    #[test]
    fn test_team_num_mapping() {
        assert_eq!(Team::from_team_num(2), Some(Team::T));
        assert_eq!(Team::from_team_num(3), Some(Team::Ct));
        assert_eq!(Team::from_team_num(0), None);
        assert_eq!(Team::T.opponent(), Team::Ct);
    }

    #[test]
    fn test_normalized_flash_accepts_both_scales() {
        let mut p = sample_player(1, Team::T, 0.0, 0.0);
        p.flash_intensity = 0.5;
        assert!((p.normalized_flash() - 0.5).abs() < f32::EPSILON);

        p.flash_intensity = 255.0;
        assert!((p.normalized_flash() - 1.0).abs() < f32::EPSILON);

        p.flash_intensity = 127.5;
        assert!((p.normalized_flash() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_bomb_carrier_ignores_dead_players() {
        let mut carrier = sample_player(1, Team::T, 0.0, 0.0);
        carrier.has_bomb = true;
        carrier.is_alive = false;
        carrier.health = 0;

        let frame = Frame { tick: 100, players: vec![carrier] };
        assert!(frame.bomb_carrier().is_none());
    }

    #[test]
    fn test_player_state_serde_defaults() {
        // Minimal payload as emitted by older parser versions.
        let json = r#"{
            "id": 76561198000000001,
            "name": "player",
            "team": "ct",
            "x": 10.0,
            "y": -20.0,
            "is_alive": true,
            "health": 100
        }"#;
        let p: PlayerState = serde_json::from_str(json).unwrap();
        assert_eq!(p.team, Team::Ct);
        assert_eq!(p.armor, 0);
        assert!(p.active_weapon.is_none());
        assert!(!p.has_bomb);
    }
}
