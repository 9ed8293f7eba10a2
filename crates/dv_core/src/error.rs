//! Engine and provider error types.
//!
//! The engine itself degrades rather than propagates: out-of-range seeks
//! clamp, degenerate calibrations substitute a safe scale, unknown grenade
//! kinds fall back to a generic category. Only data validation at load time
//! and the external provider boundary produce typed errors.

use thiserror::Error;

/// Errors raised while validating round data before it enters the engine.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("round has no frames")]
    EmptyFrames,

    #[error(
        "frame ticks must be strictly increasing: frame {index} has tick {tick}, previous was {prev}"
    )]
    NonMonotonicTicks { index: usize, tick: u64, prev: u64 },
}

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Failures at the round-data provider boundary.
///
/// Mirrors the error taxonomy the host surfaces to the user: a round whose
/// frames were never generated is recoverable (the host can trigger a
/// reparse), a corrupted cache is not.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("round {round} not found in document")]
    UnknownRound { round: u32 },

    #[error("frame data for round {round} has not been generated yet")]
    NotProcessed { round: u32 },

    #[error("demo data unavailable: {0}")]
    Unavailable(String),

    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("malformed round data: {0}")]
    Malformed(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache encode error: {0}")]
    CacheEncode(#[from] rmp_serde::encode::Error),

    #[error("cache decode error: {0}")]
    CacheDecode(#[from] rmp_serde::decode::Error),

    #[error("cache decompression failed")]
    Decompression,

    #[error("cache checksum mismatch")]
    ChecksumMismatch,

    #[error("cache version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("not a replay cache file")]
    BadMagic,
}

impl ProviderError {
    /// Whether retrying (or triggering a background reparse) can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProviderError::NotProcessed { .. } => true,
            ProviderError::Unavailable(_) => true,
            ProviderError::Transient(_) => true,
            ProviderError::Io(_) => true,
            ProviderError::UnknownRound { .. } => false,
            ProviderError::Malformed(_) => false,
            ProviderError::Json(_) => false,
            ProviderError::CacheEncode(_) => false,
            ProviderError::CacheDecode(_) => false,
            ProviderError::Decompression => false,
            ProviderError::ChecksumMismatch => false,
            ProviderError::VersionMismatch { .. } => false,
            ProviderError::BadMagic => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ProviderError::NotProcessed { round: 3 }.is_recoverable());
        assert!(ProviderError::Transient("timeout".into()).is_recoverable());
        assert!(!ProviderError::ChecksumMismatch.is_recoverable());
        assert!(!ProviderError::Malformed(ReplayError::EmptyFrames).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = ReplayError::NonMonotonicTicks { index: 4, tick: 100, prev: 108 };
        assert!(err.to_string().contains("frame 4"));
        assert!(err.to_string().contains("108"));
    }
}
