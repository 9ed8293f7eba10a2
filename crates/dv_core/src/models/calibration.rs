//! Per-map radar calibration.
//!
//! Each map's overview image is described by three constants: the world
//! coordinates of the radar's top-left corner (`pos_x`, `pos_y`) and the
//! number of world units per radar pixel (`scale`). Radar images are a
//! logical 1024x1024 regardless of the shipped texture resolution.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Logical radar image edge length in pixels.
pub const RADAR_LOGICAL_SIZE: f32 = 1024.0;

/// Constants mapping world coordinates onto a map's radar image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCalibration {
    /// World X of the radar's left edge.
    pub pos_x: f32,
    /// World Y of the radar's top edge. World Y grows "north", radar Y
    /// grows down; the transform inverts that one axis.
    pub pos_y: f32,
    /// World units per radar pixel.
    pub scale: f32,
    #[serde(default = "default_radar_dim")]
    pub radar_width: f32,
    #[serde(default = "default_radar_dim")]
    pub radar_height: f32,
}

fn default_radar_dim() -> f32 {
    RADAR_LOGICAL_SIZE
}

impl MapCalibration {
    pub fn new(pos_x: f32, pos_y: f32, scale: f32) -> MapCalibration {
        MapCalibration {
            pos_x,
            pos_y,
            scale,
            radar_width: RADAR_LOGICAL_SIZE,
            radar_height: RADAR_LOGICAL_SIZE,
        }
    }

    /// Calibration for a known map, by canonical name (e.g. "de_mirage").
    pub fn for_map(map_name: &str) -> Option<MapCalibration> {
        CALIBRATIONS.get(map_name).copied()
    }

    /// Calibration for a map, falling back to a neutral mapping that keeps
    /// typical coordinates on-screen when the map is not in the table.
    pub fn for_map_or_fallback(map_name: &str) -> MapCalibration {
        MapCalibration::for_map(map_name).unwrap_or_else(|| {
            log::warn!("no radar calibration for map '{}', using fallback", map_name);
            MapCalibration::fallback()
        })
    }

    /// Neutral calibration: covers world X/Y in [-2048, 2048].
    pub fn fallback() -> MapCalibration {
        MapCalibration::new(-2048.0, 2048.0, 4.0)
    }

    /// Copy with degenerate values replaced: a zero or negative scale
    /// becomes 1.0, zero radar dimensions become the logical size. The
    /// substitution is logged once here so the per-frame transform path
    /// stays silent.
    pub fn sanitized(&self) -> MapCalibration {
        let mut cal = *self;
        if !(cal.scale > 0.0) {
            log::warn!("degenerate calibration scale {}, substituting 1.0", cal.scale);
            cal.scale = 1.0;
        }
        if !(cal.radar_width > 0.0) {
            cal.radar_width = RADAR_LOGICAL_SIZE;
        }
        if !(cal.radar_height > 0.0) {
            cal.radar_height = RADAR_LOGICAL_SIZE;
        }
        cal
    }
}

/// Radar constants for the competitive map pool.
static CALIBRATIONS: Lazy<HashMap<&'static str, MapCalibration>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert("de_ancient", MapCalibration::new(-2953.0, 2164.0, 5.0));
    table.insert("de_anubis", MapCalibration::new(-2796.0, 3328.0, 5.22));
    table.insert("de_cache", MapCalibration::new(-2000.0, 3250.0, 5.5));
    table.insert("de_dust2", MapCalibration::new(-2476.0, 3239.0, 4.4));
    table.insert("de_inferno", MapCalibration::new(-2087.0, 3870.0, 4.9));
    table.insert("de_mirage", MapCalibration::new(-3230.0, 1713.0, 5.0));
    table.insert("de_nuke", MapCalibration::new(-3453.0, 2887.0, 7.0));
    table.insert("de_overpass", MapCalibration::new(-4831.0, 1781.0, 5.2));
    table.insert("de_train", MapCalibration::new(-2477.0, 2392.0, 4.7));
    table.insert("de_vertigo", MapCalibration::new(-3168.0, 1762.0, 4.0));
    table
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_map_lookup() {
        let cal = MapCalibration::for_map("de_mirage").unwrap();
        assert_eq!(cal.scale, 5.0);
        assert_eq!(cal.radar_width, RADAR_LOGICAL_SIZE);
    }

    #[test]
    fn test_unknown_map_falls_back() {
        let cal = MapCalibration::for_map_or_fallback("de_workshop_test");
        assert_eq!(cal, MapCalibration::fallback());
    }

    #[test]
    fn test_sanitize_degenerate_scale() {
        let cal = MapCalibration::new(0.0, 0.0, 0.0).sanitized();
        assert_eq!(cal.scale, 1.0);

        let cal = MapCalibration::new(0.0, 0.0, -3.5).sanitized();
        assert_eq!(cal.scale, 1.0);

        let cal = MapCalibration::new(0.0, 0.0, 4.4).sanitized();
        assert_eq!(cal.scale, 4.4);
    }

    #[test]
    fn test_serde_defaults_radar_dims() {
        let json = r#"{ "pos_x": -2476.0, "pos_y": 3239.0, "scale": 4.4 }"#;
        let cal: MapCalibration = serde_json::from_str(json).unwrap();
        assert_eq!(cal.radar_width, RADAR_LOGICAL_SIZE);
        assert_eq!(cal.radar_height, RADAR_LOGICAL_SIZE);
    }
}
