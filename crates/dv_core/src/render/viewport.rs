//! User-controlled zoom/pan state.
//!
//! Independent of playback: the viewport only parameterizes the final
//! surface transform. All inputs are sanitized (clamped or ignored), never
//! rejected.

use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 4.0;

/// Multiplicative zoom per wheel notch.
const ZOOM_STEP: f32 = 1.2;

/// The zoom/pan transform applied once over the whole drawing surface:
/// `screen = canvas * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

/// Sole owner of the viewport. Translates pointer gestures into transform
/// updates; nothing else writes scale/offset.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    viewport: Viewport,
}

impl ViewportController {
    pub fn new() -> ViewportController {
        ViewportController::default()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zoom by `delta` wheel notches (positive = in), keeping the content
    /// point under the pointer stationary: the pointer is converted to
    /// pre-zoom content space, the new scale applied, and the offset
    /// re-derived so that content point maps back to the same screen pixel.
    pub fn zoom_at(&mut self, pointer_x: f32, pointer_y: f32, delta: f32) {
        if !delta.is_finite() || !pointer_x.is_finite() || !pointer_y.is_finite() {
            return;
        }
        let new_scale = (self.viewport.scale * ZOOM_STEP.powf(delta)).clamp(MIN_SCALE, MAX_SCALE);
        self.set_scale_at(pointer_x, pointer_y, new_scale);
    }

    /// Set an absolute scale, anchored at the given pointer position.
    pub fn set_scale_at(&mut self, pointer_x: f32, pointer_y: f32, scale: f32) {
        if !scale.is_finite() {
            return;
        }
        let vp = &mut self.viewport;
        let new_scale = scale.clamp(MIN_SCALE, MAX_SCALE);

        let content_x = (pointer_x - vp.offset_x) / vp.scale;
        let content_y = (pointer_y - vp.offset_y) / vp.scale;

        vp.scale = new_scale;
        vp.offset_x = pointer_x - content_x * new_scale;
        vp.offset_y = pointer_y - content_y * new_scale;
    }

    /// Additive pan, typically from a drag gesture. Panning past the content
    /// bounds is allowed.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.viewport.offset_x += dx;
        self.viewport.offset_y += dy;
    }

    pub fn reset(&mut self) {
        self.viewport = Viewport::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::transform::apply_viewport;
    use nalgebra::Point2;

    #[test]
    fn test_zoom_anchor_is_stationary() {
        let mut ctl = ViewportController::new();
        ctl.pan(30.0, -12.0);

        // A content point currently rendered under the pointer.
        let pointer = Point2::new(200.0, 150.0);
        let vp = ctl.viewport();
        let content = Point2::new(
            (pointer.x - vp.offset_x) / vp.scale,
            (pointer.y - vp.offset_y) / vp.scale,
        );

        ctl.zoom_at(pointer.x, pointer.y, 1.0);
        let after = apply_viewport(content, &ctl.viewport());
        assert!((after.x - pointer.x).abs() < 1e-3);
        assert!((after.y - pointer.y).abs() < 1e-3);

        // And again through several notches in both directions.
        ctl.zoom_at(pointer.x, pointer.y, 2.0);
        ctl.zoom_at(pointer.x, pointer.y, -1.5);
        let after = apply_viewport(content, &ctl.viewport());
        assert!((after.x - pointer.x).abs() < 1e-3);
        assert!((after.y - pointer.y).abs() < 1e-3);
    }

    #[test]
    fn test_scale_clamped() {
        let mut ctl = ViewportController::new();
        ctl.zoom_at(0.0, 0.0, 100.0);
        assert_eq!(ctl.viewport().scale, MAX_SCALE);

        ctl.zoom_at(0.0, 0.0, -100.0);
        assert_eq!(ctl.viewport().scale, MIN_SCALE);
    }

    #[test]
    fn test_pan_unbounded_and_additive() {
        let mut ctl = ViewportController::new();
        ctl.pan(1e6, -1e6);
        ctl.pan(5.0, 5.0);
        let vp = ctl.viewport();
        assert_eq!(vp.offset_x, 1e6 + 5.0);
        assert_eq!(vp.offset_y, -1e6 + 5.0);
    }

    #[test]
    fn test_non_finite_input_ignored() {
        let mut ctl = ViewportController::new();
        ctl.zoom_at(f32::NAN, 0.0, 1.0);
        ctl.pan(f32::INFINITY, 0.0);
        assert_eq!(ctl.viewport(), Viewport::default());
    }

    #[test]
    fn test_reset() {
        let mut ctl = ViewportController::new();
        ctl.zoom_at(100.0, 100.0, 2.0);
        ctl.pan(40.0, 40.0);
        ctl.reset();
        assert_eq!(ctl.viewport(), Viewport::default());
    }
}
