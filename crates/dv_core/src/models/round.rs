//! Round framing data and the per-round frame store.

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::models::calibration::MapCalibration;
use crate::models::events::{EventLedger, ReplayEvent};
use crate::models::frame::{Frame, Team};

/// How the round was decided. Constructed from the parser's end-reason
/// codes; codes outside the competitive set map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    BombExploded,
    BombDefused,
    CtElimination,
    TElimination,
    TimeExpired,
    #[default]
    Unknown,
}

impl WinReason {
    pub fn from_code(code: u8) -> WinReason {
        match code {
            1 => WinReason::BombExploded,
            7 => WinReason::BombDefused,
            8 => WinReason::CtElimination,
            9 => WinReason::TElimination,
            12 => WinReason::TimeExpired,
            _ => WinReason::Unknown,
        }
    }
}

/// One side's name and score as of this round's end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TeamScore {
    pub name: String,
    pub score: u32,
}

/// One round's static framing info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetadata {
    pub round_number: u32,
    /// Canonical map name (e.g. "de_mirage"); selects the radar background.
    #[serde(default)]
    pub map_name: String,
    pub start_tick: u64,
    pub end_tick: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_end_tick: Option<u64>,
    /// Demo ticks per simulated second.
    pub tick_rate: u32,
    pub team_ct: TeamScore,
    pub team_t: TeamScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Team>,
    #[serde(default)]
    pub win_reason: WinReason,
}

impl RoundMetadata {
    /// Tick rate with the zero guard applied. A zero rate would turn every
    /// tick/seconds conversion into NaN, so it degrades to 1.
    pub fn effective_tick_rate(&self) -> f64 {
        if self.tick_rate == 0 {
            1.0
        } else {
            f64::from(self.tick_rate)
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_tick.saturating_sub(self.start_tick) as f64 / self.effective_tick_rate()
    }

    /// Seconds from round start to the given tick (clamped below at 0).
    pub fn seconds_at(&self, tick: u64) -> f64 {
        tick.saturating_sub(self.start_tick) as f64 / self.effective_tick_rate()
    }
}

/// One round's immutable replay data: metadata, calibration, the sampled
/// frame sequence, and the event ledger. Validated on construction; every
/// lookup afterwards clamps instead of failing.
#[derive(Debug, Clone)]
pub struct RoundData {
    metadata: RoundMetadata,
    calibration: MapCalibration,
    frames: Vec<Frame>,
    events: EventLedger,
}

impl RoundData {
    /// Validate and assemble a round.
    ///
    /// Frames must be non-empty with strictly increasing ticks. The metadata
    /// tick range is normalized to cover the frame sequence (`start_tick` :=
    /// first frame tick; `end_tick` grows to the last frame tick if the
    /// supplied value falls short). A degenerate calibration scale is
    /// replaced here, once, so the transform pipeline never divides by zero.
    pub fn new(
        mut metadata: RoundMetadata,
        calibration: MapCalibration,
        frames: Vec<Frame>,
        events: Vec<ReplayEvent>,
    ) -> Result<RoundData, ReplayError> {
        if frames.is_empty() {
            return Err(ReplayError::EmptyFrames);
        }
        for (index, pair) in frames.windows(2).enumerate() {
            if pair[1].tick <= pair[0].tick {
                return Err(ReplayError::NonMonotonicTicks {
                    index: index + 1,
                    tick: pair[1].tick,
                    prev: pair[0].tick,
                });
            }
        }

        let first_tick = frames[0].tick;
        let last_tick = frames[frames.len() - 1].tick;
        if metadata.start_tick != first_tick {
            log::debug!(
                "round {}: normalizing start_tick {} -> {}",
                metadata.round_number,
                metadata.start_tick,
                first_tick
            );
            metadata.start_tick = first_tick;
        }
        if metadata.end_tick < last_tick {
            log::debug!(
                "round {}: normalizing end_tick {} -> {}",
                metadata.round_number,
                metadata.end_tick,
                last_tick
            );
            metadata.end_tick = last_tick;
        }

        for frame in &frames {
            let carriers = frame.players.iter().filter(|p| p.is_alive && p.has_bomb).count();
            if carriers > 1 {
                log::warn!(
                    "round {}: {} simultaneous bomb carriers at tick {}",
                    metadata.round_number,
                    carriers,
                    frame.tick
                );
                break;
            }
        }

        Ok(RoundData {
            metadata,
            calibration: calibration.sanitized(),
            frames,
            events: EventLedger::new(events),
        })
    }

    pub fn metadata(&self) -> &RoundMetadata {
        &self.metadata
    }

    pub fn calibration(&self) -> &MapCalibration {
        &self.calibration
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn start_tick(&self) -> u64 {
        self.metadata.start_tick
    }

    pub fn end_tick(&self) -> u64 {
        self.metadata.end_tick
    }

    /// Index of the most recent frame with `tick <= t` (hold-last
    /// semantics). Ticks before the first frame resolve to frame 0.
    /// O(log n).
    pub fn frame_index_at_tick(&self, tick: u64) -> usize {
        self.frames.partition_point(|f| f.tick <= tick).saturating_sub(1)
    }

    pub fn frame_at_tick(&self, tick: u64) -> &Frame {
        &self.frames[self.frame_index_at_tick(tick)]
    }

    /// Clamp an arbitrary tick into the round's range.
    pub fn clamp_tick(&self, tick: u64) -> u64 {
        tick.clamp(self.metadata.start_tick, self.metadata.end_tick)
    }

    pub fn events(&self) -> &EventLedger {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gen::{sample_frames, sample_metadata, sample_round};

    #[test]
    fn test_empty_frames_rejected() {
        let meta = sample_metadata(100, 1000, 64);
        let result = RoundData::new(meta, MapCalibration::fallback(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(ReplayError::EmptyFrames)));
    }

    #[test]
    fn test_non_monotonic_ticks_rejected() {
        let meta = sample_metadata(100, 1000, 64);
        let mut frames = sample_frames(100, 3, 8);
        frames[2].tick = frames[1].tick; // duplicate tick
        let result = RoundData::new(meta, MapCalibration::fallback(), frames, Vec::new());
        assert!(matches!(result, Err(ReplayError::NonMonotonicTicks { index: 2, .. })));
    }

    #[test]
    fn test_tick_range_normalized_to_frames() {
        let meta = sample_metadata(50, 108, 64); // start before first frame, end before last
        let frames = sample_frames(100, 3, 8); // ticks 100, 108, 116
        let round = RoundData::new(meta, MapCalibration::fallback(), frames, Vec::new()).unwrap();
        assert_eq!(round.start_tick(), 100);
        assert_eq!(round.end_tick(), 116);
    }

    #[test]
    fn test_frame_hold_lookup() {
        let round = sample_round();
        // sample_round has frames at ticks 100, 108, 116, ...
        assert_eq!(round.frame_index_at_tick(110), 1);
        assert_eq!(round.frame_at_tick(110).tick, 108);
        assert_eq!(round.frame_index_at_tick(108), 1);
        assert_eq!(round.frame_index_at_tick(107), 0);
        // Before the first frame: fall back to frame 0.
        assert_eq!(round.frame_index_at_tick(0), 0);
    }

    #[test]
    fn test_zero_tick_rate_guarded() {
        let meta = sample_metadata(100, 1000, 0);
        assert_eq!(meta.effective_tick_rate(), 1.0);
        assert!(meta.duration_seconds().is_finite());
    }

    #[test]
    fn test_win_reason_codes() {
        assert_eq!(WinReason::from_code(1), WinReason::BombExploded);
        assert_eq!(WinReason::from_code(7), WinReason::BombDefused);
        assert_eq!(WinReason::from_code(200), WinReason::Unknown);
    }
}
