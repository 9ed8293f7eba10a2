//! # dv_core - Replay Playback & Rendering Engine
//!
//! Turns sparse per-tick game-state snapshots and discrete timestamped
//! events from parsed demo telemetry into a smooth, scrubbable, zoomable 2D
//! visualization with bounded-lifetime overlays (kills, grenades, bomb
//! state).
//!
//! ## Architecture
//! - One [`ReplayEngine`] per viewing session owns the loaded round, the
//!   playback clock, the viewport, and the display toggles
//! - The host animation loop calls `advance()` once per frame and polls the
//!   dirty flag before painting
//! - [`render::scene::build`] produces a deterministic, layered draw list;
//!   any drawing backend maps it to pixels
//! - Round data arrives through the [`provider::RoundDataProvider`]
//!   boundary; the engine never fetches or retries on its own

// Test fixtures (models::gen) are compiled into the library like the rest
// of the data model; they are dead weight outside tests.
#![allow(dead_code)]
// Scene/engine constructors legitimately take the full input set.
#![allow(clippy::too_many_arguments)]

pub mod error;
pub mod models;
pub mod provider;
pub mod render;
pub mod replay;

// Re-export the engine surface
pub use error::{ProviderError, ReplayError, Result};
pub use models::{
    BombSite, EventBase, EventKind, EventLedger, Frame, GrenadeKind, MapCalibration, PlayerState,
    ReplayEvent, RoundData, RoundMetadata, Team, TeamScore, WinReason, WorldPos,
};
pub use provider::{
    DemoDocument, DemoMetadata, FileProvider, RoundDataProvider, RoundInfo, RoundPayload,
};
pub use render::{CanvasPoint, CanvasSize, DisplayToggles, FireQuality, Scene, Viewport, ViewportController};
pub use replay::{
    ActiveEvent, ActiveSet, BombPhase, CategoryFilter, LifecycleStage, PlaybackClock,
    PlaybackInfo, PlaybackSpeed, PlaybackStatus, ReplayEngine,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
