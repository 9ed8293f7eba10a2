//! Parsed-demo document model.
//!
//! Mirrors the output of the demo parser service: match-level metadata, a
//! round index, and the full-match frame/event streams. A document is the
//! unit of storage; the engine consumes per-round slices produced by
//! [`DemoDocument::slice_round`].

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::calibration::MapCalibration;
use crate::models::events::ReplayEvent;
use crate::models::frame::{Frame, Team};
use crate::models::round::{RoundMetadata, TeamScore, WinReason};
use crate::provider::RoundPayload;

fn default_tick_rate() -> u32 {
    64
}

/// Match-level metadata for one parsed demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DemoMetadata {
    pub demo_file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_file_hash: Option<String>,
    pub map_name: String,
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    pub total_ticks: u64,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_timestamp: Option<DateTime<Utc>>,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_score: u32,
    pub team2_score: u32,
}

impl Default for DemoMetadata {
    fn default() -> Self {
        DemoMetadata {
            demo_file_name: String::new(),
            demo_file_hash: None,
            map_name: String::new(),
            tick_rate: default_tick_rate(),
            total_ticks: 0,
            duration_seconds: 0.0,
            match_date: None,
            parse_timestamp: None,
            team1_name: "Terrorists".to_string(),
            team2_name: "Counter-Terrorists".to_string(),
            team1_score: 0,
            team2_score: 0,
        }
    }
}

/// One round's entry in the document index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoundInfo {
    pub round_number: u32,
    pub start_tick: u64,
    pub end_tick: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_end_tick: Option<u64>,
    /// Winner team number (2 = T, 3 = CT).
    pub winner_team: u8,
    #[serde(default)]
    pub end_reason_code: u8,
    #[serde(default)]
    pub ct_score: u32,
    #[serde(default)]
    pub t_score: u32,
    #[serde(default)]
    pub bomb_planted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bomb_plant_tick: Option<u64>,
    #[serde(default)]
    pub bomb_defused: bool,
    #[serde(default)]
    pub bomb_exploded: bool,
}

/// A complete parsed demo: metadata, round index, and the match-wide frame
/// and event streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DemoDocument {
    pub metadata: DemoMetadata,
    pub rounds: Vec<RoundInfo>,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}

impl DemoDocument {
    pub fn round(&self, round_number: u32) -> Option<&RoundInfo> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    /// Per-round metadata assembled from the round index and match info.
    fn round_metadata(&self, info: &RoundInfo) -> RoundMetadata {
        RoundMetadata {
            round_number: info.round_number,
            map_name: self.metadata.map_name.clone(),
            start_tick: info.start_tick,
            end_tick: info.end_tick,
            freeze_end_tick: info.freeze_end_tick,
            tick_rate: self.metadata.tick_rate,
            team_ct: TeamScore { name: self.metadata.team2_name.clone(), score: info.ct_score },
            team_t: TeamScore { name: self.metadata.team1_name.clone(), score: info.t_score },
            winner: Team::from_team_num(info.winner_team),
            win_reason: WinReason::from_code(info.end_reason_code),
        }
    }

    /// Cut one round's payload out of the match streams.
    ///
    /// Frames inside the round's tick range are sub-sampled at `stride`
    /// (keep every Nth, always keeping the first so the round opens on a
    /// real frame). Events are clipped to the same range. A round present in
    /// the index but without any frames reports `NotProcessed`, the
    /// regeneration path, not a hard failure.
    pub fn slice_round(&self, round_number: u32, stride: u32) -> Result<RoundPayload, ProviderError> {
        let info = self
            .round(round_number)
            .ok_or(ProviderError::UnknownRound { round: round_number })?;

        let stride = stride.max(1) as usize;
        let frames: Vec<Frame> = self
            .frames
            .iter()
            .filter(|f| f.tick >= info.start_tick && f.tick <= info.end_tick)
            .enumerate()
            .filter(|(i, _)| i % stride == 0)
            .map(|(_, f)| f.clone())
            .collect();

        if frames.is_empty() {
            return Err(ProviderError::NotProcessed { round: round_number });
        }

        let events: Vec<ReplayEvent> = self
            .events
            .iter()
            .filter(|e| e.tick() >= info.start_tick && e.tick() <= info.end_tick)
            .cloned()
            .collect();

        log::debug!(
            "sliced round {}: {} frames (stride {}), {} events",
            round_number,
            frames.len(),
            stride,
            events.len()
        );

        Ok(RoundPayload {
            metadata: self.round_metadata(info),
            calibration: MapCalibration::for_map_or_fallback(&self.metadata.map_name),
            frames,
            events,
        })
    }
}
