//! Display preference surface.
//!
//! Plain configuration consumed by the resolver and the scene builder. Any
//! UI control may read/write these; the engine only sanitizes ranges. The
//! related `playbackSpeed` preference is routed to the playback clock (its
//! sole owner) rather than stored here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::replay::visibility::CategoryFilter;

pub const MIN_TRAIL_LENGTH: u32 = 10;
pub const MAX_TRAIL_LENGTH: u32 = 80;

/// Fire/smoke effect fidelity: controls the deterministic particle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FireQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl FireQuality {
    pub fn particle_count(self) -> usize {
        match self {
            FireQuality::Low => 8,
            FireQuality::Medium => 16,
            FireQuality::High => 32,
        }
    }
}

/// Per-category display toggles. Field names follow the host application's
/// camelCase preference keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayToggles {
    pub show_kill_lines: bool,
    pub show_grenades: bool,
    pub show_trajectories: bool,
    pub show_player_names: bool,
    pub show_health_bars: bool,
    pub show_trails: bool,
    /// Trail history in frames, clamped to 10..=80.
    pub trail_length: u32,
    pub fire_quality: FireQuality,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        DisplayToggles {
            show_kill_lines: true,
            show_grenades: true,
            show_trajectories: false,
            show_player_names: true,
            show_health_bars: true,
            show_trails: false,
            trail_length: 20,
            fire_quality: FireQuality::default(),
        }
    }
}

impl DisplayToggles {
    /// Copy with out-of-range values clamped into their valid ranges.
    pub fn sanitized(&self) -> DisplayToggles {
        let mut toggles = self.clone();
        toggles.trail_length = toggles.trail_length.clamp(MIN_TRAIL_LENGTH, MAX_TRAIL_LENGTH);
        toggles
    }
}

impl From<&DisplayToggles> for CategoryFilter {
    fn from(toggles: &DisplayToggles) -> CategoryFilter {
        CategoryFilter { kills: toggles.show_kill_lines, grenades: toggles.show_grenades }
    }
}
