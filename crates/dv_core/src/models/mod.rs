//! Round data model: frames, events, metadata, calibration.

pub mod calibration;
pub mod events;
pub mod frame;
pub mod gen;
pub mod round;

// Re-export main types for convenience
pub use calibration::{MapCalibration, RADAR_LOGICAL_SIZE};
pub use events::{
    BombSite, EventBase, EventKind, EventLedger, GrenadeKind, ReplayEvent, WorldPos,
    ORIGIN_EPSILON,
};
pub use frame::{Frame, PlayerState, Team};
pub use round::{RoundData, RoundMetadata, TeamScore, WinReason};
