//! Rendering support: coordinate transforms, viewport, toggles, and the
//! draw-list scene contract. No drawing technology is assumed; a backend
//! consumes [`scene::Scene`] primitives in struct order.

pub mod scene;
pub mod toggles;
pub mod transform;
pub mod viewport;

// Re-export main types for convenience
pub use scene::{
    Background, BombIndicator, BombIndicatorState, GrenadeEffect, KillLine, Particle,
    PlayerMarker, Scene, SurfaceTransform, TrailPolyline, TrajectoryLine,
};
pub use toggles::{DisplayToggles, FireQuality, MAX_TRAIL_LENGTH, MIN_TRAIL_LENGTH};
pub use transform::{
    apply_viewport, canvas_to_world, radar_to_canvas, radar_to_world, unapply_viewport,
    world_length_to_canvas, world_to_canvas, world_to_radar, CanvasPoint, CanvasSize,
};
pub use viewport::{Viewport, ViewportController, MAX_SCALE, MIN_SCALE};
