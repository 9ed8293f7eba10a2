//! Playback: the clock state machine, the engine instance, and event
//! visibility resolution.

pub mod clock;
pub mod engine;
pub mod visibility;

// Re-export main types for convenience
pub use clock::{PlaybackClock, PlaybackSpeed, PlaybackStatus};
pub use engine::{PlaybackInfo, ReplayEngine};
pub use visibility::{
    resolve_active, ActiveEvent, ActiveSet, BombPhase, CategoryFilter, LifecycleStage,
    GRENADE_WINDOW_SECS, KILL_WINDOW_SECS,
};
