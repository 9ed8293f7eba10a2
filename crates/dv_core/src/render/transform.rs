//! Coordinate transform pipeline.
//!
//! ## Coordinate systems
//!
//! **World** (demo telemetry): map units, Y grows "north". Unbounded.
//!
//! **Radar** (overview image pixels): origin at the image's top-left, Y grows
//! down, logical size 1024x1024. `MapCalibration` anchors this space in the
//! world: `radar = ((x - pos_x) / scale, (pos_y - y) / scale)`. The Y axis is
//! inverted exactly once, here.
//!
//! **Canvas** (output pixels, pre-viewport): radar scaled to the drawing
//! surface dimensions.
//!
//! **Screen**: canvas after the user's zoom/pan, applied as one affine over
//! the whole surface (see [`crate::render::viewport`]), never per entity.
//! Pointer math stays a single inversion.
//!
//! All functions are pure and deterministic; the composition is bijective
//! for any sanitized calibration (scale > 0).

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::models::calibration::{MapCalibration, RADAR_LOGICAL_SIZE};
use crate::render::viewport::Viewport;

/// A point in canvas space (output pixels, pre-viewport).
pub type CanvasPoint = Point2<f32>;

/// Drawing surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> CanvasSize {
        CanvasSize { width, height }
    }

    /// Square canvas, the common case for radar views.
    pub fn square(edge: f32) -> CanvasSize {
        CanvasSize { width: edge, height: edge }
    }
}

#[inline]
fn safe_scale(scale: f32) -> f32 {
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[inline]
fn safe_dim(dim: f32) -> f32 {
    if dim > 0.0 {
        dim
    } else {
        RADAR_LOGICAL_SIZE
    }
}

/// World position to radar pixels. Subtracts the world origin offset,
/// divides by the world-units-per-pixel scale, and inverts Y (world north is
/// radar up, i.e. decreasing row).
#[inline]
pub fn world_to_radar(x: f32, y: f32, cal: &MapCalibration) -> (f32, f32) {
    let s = safe_scale(cal.scale);
    ((x - cal.pos_x) / s, (cal.pos_y - y) / s)
}

/// Inverse of [`world_to_radar`].
#[inline]
pub fn radar_to_world(rx: f32, ry: f32, cal: &MapCalibration) -> (f32, f32) {
    let s = safe_scale(cal.scale);
    (cal.pos_x + rx * s, cal.pos_y - ry * s)
}

/// Radar pixels to canvas pixels.
#[inline]
pub fn radar_to_canvas(rx: f32, ry: f32, cal: &MapCalibration, canvas: CanvasSize) -> CanvasPoint {
    Point2::new(
        rx / safe_dim(cal.radar_width) * canvas.width,
        ry / safe_dim(cal.radar_height) * canvas.height,
    )
}

/// Inverse of [`radar_to_canvas`].
#[inline]
pub fn canvas_to_radar(pt: CanvasPoint, cal: &MapCalibration, canvas: CanvasSize) -> (f32, f32) {
    (
        pt.x / canvas.width * safe_dim(cal.radar_width),
        pt.y / canvas.height * safe_dim(cal.radar_height),
    )
}

/// Full pipeline: world to canvas pixels (pre-viewport).
pub fn world_to_canvas(x: f32, y: f32, cal: &MapCalibration, canvas: CanvasSize) -> CanvasPoint {
    let (rx, ry) = world_to_radar(x, y, cal);
    radar_to_canvas(rx, ry, cal, canvas)
}

/// Full inverse pipeline: canvas pixels back to world coordinates.
pub fn canvas_to_world(pt: CanvasPoint, cal: &MapCalibration, canvas: CanvasSize) -> (f32, f32) {
    let (rx, ry) = canvas_to_radar(pt, cal, canvas);
    radar_to_world(rx, ry, cal)
}

/// Convert a world-space length (e.g. a smoke radius) to canvas pixels.
/// Uses the horizontal axis; radar pixels are square.
pub fn world_length_to_canvas(length: f32, cal: &MapCalibration, canvas: CanvasSize) -> f32 {
    length / safe_scale(cal.scale) / safe_dim(cal.radar_width) * canvas.width
}

/// Apply the user viewport to a canvas point, yielding screen pixels. The
/// renderer applies this once to the whole surface; it is exposed here for
/// hit-testing and tests.
#[inline]
pub fn apply_viewport(pt: CanvasPoint, viewport: &Viewport) -> CanvasPoint {
    Point2::from(pt.coords * viewport.scale + Vector2::new(viewport.offset_x, viewport.offset_y))
}

/// Inverse of [`apply_viewport`]: screen pixels back to canvas space.
#[inline]
pub fn unapply_viewport(pt: CanvasPoint, viewport: &Viewport) -> CanvasPoint {
    let s = safe_scale(viewport.scale);
    Point2::from((pt.coords - Vector2::new(viewport.offset_x, viewport.offset_y)) / s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: CanvasSize = CanvasSize { width: 512.0, height: 512.0 };

    fn dust2() -> MapCalibration {
        MapCalibration::for_map("de_dust2").unwrap()
    }

    #[test]
    fn test_world_to_radar_inverts_y_only() {
        let cal = MapCalibration::new(-1000.0, 1000.0, 2.0);
        let (rx, ry) = world_to_radar(-1000.0, 1000.0, &cal);
        assert_eq!((rx, ry), (0.0, 0.0));

        // Moving north in the world moves up (lower row) on the radar.
        let (_, ry_north) = world_to_radar(-1000.0, 1200.0, &cal);
        assert!(ry_north < ry);

        // Moving east keeps the same sign direction.
        let (rx_east, _) = world_to_radar(-800.0, 1000.0, &cal);
        assert!(rx_east > rx);
    }

    #[test]
    fn test_round_trip_exact_points() {
        let cal = dust2();
        let (x, y) = (217.5, -832.25);
        let pt = world_to_canvas(x, y, &cal, CANVAS);
        let (bx, by) = canvas_to_world(pt, &cal, CANVAS);
        assert!((bx - x).abs() < 1e-2);
        assert!((by - y).abs() < 1e-2);
    }

    #[test]
    fn test_degenerate_scale_substituted() {
        let cal = MapCalibration::new(0.0, 0.0, 0.0);
        let (rx, ry) = world_to_radar(100.0, -100.0, &cal);
        assert_eq!((rx, ry), (100.0, 100.0));
        assert!(rx.is_finite() && ry.is_finite());
    }

    #[test]
    fn test_world_length_scales_with_canvas() {
        let cal = MapCalibration::new(0.0, 0.0, 4.0);
        // 400 world units = 100 radar px = 50 canvas px on a 512 canvas.
        let px = world_length_to_canvas(400.0, &cal, CANVAS);
        assert!((px - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_viewport_round_trip() {
        let viewport = Viewport { scale: 2.5, offset_x: -120.0, offset_y: 48.0 };
        let pt = Point2::new(200.0, 300.0);
        let back = unapply_viewport(apply_viewport(pt, &viewport), &viewport);
        assert!((back.x - pt.x).abs() < 1e-3);
        assert!((back.y - pt.y).abs() < 1e-3);
    }

    #[test]
    fn test_determinism() {
        let cal = dust2();
        let a = world_to_canvas(512.0, 512.0, &cal, CANVAS);
        let b = world_to_canvas(512.0, 512.0, &cal, CANVAS);
        assert_eq!(a, b);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the world->canvas->world composition is bijective
            /// for any valid calibration.
            #[test]
            fn prop_pipeline_round_trip(
                x in -8000.0f32..8000.0,
                y in -8000.0f32..8000.0,
                pos_x in -5000.0f32..0.0,
                pos_y in 0.0f32..5000.0,
                scale in 1.0f32..10.0,
            ) {
                let cal = MapCalibration::new(pos_x, pos_y, scale);
                let pt = world_to_canvas(x, y, &cal, CANVAS);
                let (bx, by) = canvas_to_world(pt, &cal, CANVAS);
                // Tolerance scales with the per-pixel world size.
                let tol = scale * 0.05;
                prop_assert!((bx - x).abs() < tol);
                prop_assert!((by - y).abs() < tol);
            }

            /// Property: transforms never produce non-finite output for
            /// finite input, even with degenerate scales.
            #[test]
            fn prop_finite_output(
                x in -1e6f32..1e6,
                y in -1e6f32..1e6,
                scale in -10.0f32..10.0,
            ) {
                let cal = MapCalibration::new(0.0, 0.0, scale);
                let pt = world_to_canvas(x, y, &cal, CANVAS);
                prop_assert!(pt.x.is_finite());
                prop_assert!(pt.y.is_finite());
            }
        }
    }
}
