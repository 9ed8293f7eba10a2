//! Round-data provider boundary.
//!
//! The engine never fetches anything itself: a host-side collaborator
//! produces a [`RoundPayload`] (over HTTP, from disk, from a cache) and
//! hands it to [`crate::replay::ReplayEngine::load`]. The trait models that
//! boundary; [`FileProvider`] is the in-repo implementation over parsed demo
//! documents.

pub mod document;
pub mod file;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::calibration::MapCalibration;
use crate::models::events::ReplayEvent;
use crate::models::frame::Frame;
use crate::models::round::RoundMetadata;

// Re-export main types for convenience
pub use document::{DemoDocument, DemoMetadata, RoundInfo};
pub use file::{
    load_document, load_document_cache, load_document_json, save_document_cache,
    save_document_json, FileProvider,
};

/// Everything the engine needs to play one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundPayload {
    pub metadata: RoundMetadata,
    pub calibration: MapCalibration,
    pub frames: Vec<Frame>,
    pub events: Vec<ReplayEvent>,
}

/// A source of per-round replay data.
///
/// `stride` is the sampling interval in frames (1 = every stored frame,
/// 0 = the provider's default). Implementations are synchronous from the
/// engine's point of view; async transports resolve before the host calls
/// `load`.
pub trait RoundDataProvider {
    fn fetch_round(&self, round_number: u32, stride: u32) -> Result<RoundPayload, ProviderError>;
}
