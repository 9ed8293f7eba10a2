//! The replay engine instance.
//!
//! One `ReplayEngine` per viewing session, owning the loaded round, the
//! playback clock, the viewport, and the display toggles; no ambient
//! global state. The host drives it: forward gesture/transport input as
//! commands, call [`ReplayEngine::advance`] once per animation frame, and
//! poll [`ReplayEngine::take_dirty`] before painting.
//!
//! While no round is loaded (idle, loading, or error-flagged), every
//! transport command is a silent no-op; only `load` changes that.

use serde::Serialize;

use crate::models::frame::Frame;
use crate::models::round::RoundData;
use crate::provider::RoundPayload;
use crate::render::scene::{self, Scene};
use crate::render::toggles::DisplayToggles;
use crate::render::transform::CanvasSize;
use crate::render::viewport::{Viewport, ViewportController};
use crate::replay::clock::{PlaybackClock, PlaybackSpeed, PlaybackStatus};
use crate::replay::visibility::{resolve_active, ActiveSet};

/// Serializable playback summary for host UIs (progress bar, transport
/// controls).
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackInfo {
    pub status: PlaybackStatus,
    pub speed: PlaybackSpeed,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_number: Option<u32>,
    pub current_tick: u64,
    pub start_tick: u64,
    pub end_tick: u64,
    pub current_time_seconds: f64,
    pub total_time_seconds: f64,
    pub progress: f64,
}

pub struct ReplayEngine {
    round: Option<RoundData>,
    clock: PlaybackClock,
    viewport: ViewportController,
    toggles: DisplayToggles,
    error: Option<String>,
    dirty: bool,
    preserve_speed: bool,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayEngine {
    pub fn new() -> ReplayEngine {
        ReplayEngine {
            round: None,
            clock: PlaybackClock::new(),
            viewport: ViewportController::new(),
            toggles: DisplayToggles::default(),
            error: None,
            dirty: false,
            preserve_speed: true,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a round switch: discard the previous round wholesale and enter
    /// the loading state while the host fetches. Any in-flight fetch for the
    /// old round is the host's to abandon.
    pub fn begin_loading(&mut self) {
        self.round = None;
        self.error = None;
        self.clock.begin_loading();
        self.viewport.reset();
        self.dirty = true;
    }

    /// Install a fetched round. On validation failure the engine enters the
    /// error-flagged state (message readable via [`ReplayEngine::error_message`])
    /// instead of panicking, and transport commands become no-ops.
    pub fn load(&mut self, payload: RoundPayload) {
        let kept_speed = self.clock.speed();
        self.round = None;

        match RoundData::new(payload.metadata, payload.calibration, payload.frames, payload.events)
        {
            Ok(round) => {
                log::info!(
                    "loaded round {} ({} frames, {} events, ticks {}..={})",
                    round.metadata().round_number,
                    round.frame_count(),
                    round.events().len(),
                    round.start_tick(),
                    round.end_tick()
                );
                self.clock.attach(&round);
                self.clock.set_speed(if self.preserve_speed {
                    kept_speed
                } else {
                    PlaybackSpeed::Normal
                });
                self.round = Some(round);
                self.error = None;
            }
            Err(err) => {
                log::warn!("rejecting round data: {}", err);
                self.clock.mark_error();
                self.error = Some(err.to_string());
            }
        }

        self.viewport.reset();
        self.dirty = true;
    }

    /// The host reports that the external fetch failed; the engine stays in
    /// the error state (it never retries on its own).
    pub fn fail_load(&mut self, message: impl Into<String>) {
        self.round = None;
        self.clock.mark_error();
        self.error = Some(message.into());
        self.dirty = true;
    }

    /// Keep the speed multiplier across round switches (default true). The
    /// viewport always resets on load.
    pub fn set_preserve_speed(&mut self, preserve: bool) {
        self.preserve_speed = preserve;
    }

    // ------------------------------------------------------------------
    // Transport commands
    // ------------------------------------------------------------------

    pub fn play(&mut self) {
        if self.round.is_some() && self.clock.play() {
            log::debug!("playback started at tick {}", self.clock.current_tick());
            self.dirty = true;
        }
    }

    pub fn pause(&mut self) {
        if self.clock.pause() {
            self.dirty = true;
        }
    }

    pub fn toggle_play(&mut self) {
        if self.round.is_some() && self.clock.toggle_play() {
            self.dirty = true;
        }
    }

    /// Host-driven tick: advance by the elapsed wall-clock seconds.
    pub fn advance(&mut self, delta_seconds: f64) {
        if let Some(round) = &self.round {
            if self.clock.advance(round, delta_seconds) {
                self.dirty = true;
            }
        }
    }

    /// Absolute jump; out-of-range indices (including negative) clamp.
    pub fn seek(&mut self, frame_index: i64) {
        if let Some(round) = &self.round {
            self.clock.seek(round, frame_index.max(0) as usize);
            self.dirty = true;
        }
    }

    pub fn seek_to_tick(&mut self, tick: u64) {
        if let Some(round) = &self.round {
            self.clock.seek_to_tick(round, tick);
            self.dirty = true;
        }
    }

    pub fn skip_forward(&mut self, seconds: f64) {
        if let Some(round) = &self.round {
            self.clock.skip_forward(round, seconds);
            self.dirty = true;
        }
    }

    pub fn skip_backward(&mut self, seconds: f64) {
        if let Some(round) = &self.round {
            self.clock.skip_backward(round, seconds);
            self.dirty = true;
        }
    }

    pub fn next_frame(&mut self) {
        if let Some(round) = &self.round {
            self.clock.next_frame(round);
            self.dirty = true;
        }
    }

    pub fn previous_frame(&mut self) {
        if let Some(round) = &self.round {
            self.clock.previous_frame(round);
            self.dirty = true;
        }
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if self.round.is_some() {
            self.clock.set_speed(speed);
            self.dirty = true;
        }
    }

    /// Speed from a raw multiplier; unsupported values are ignored.
    pub fn set_speed_multiplier(&mut self, value: f64) {
        if self.round.is_some() && self.clock.set_speed_multiplier(value) {
            self.dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Viewport and toggles
    // ------------------------------------------------------------------

    pub fn zoom_at(&mut self, pointer_x: f32, pointer_y: f32, delta: f32) {
        self.viewport.zoom_at(pointer_x, pointer_y, delta);
        self.dirty = true;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.viewport.pan(dx, dy);
        self.dirty = true;
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
        self.dirty = true;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn toggles(&self) -> &DisplayToggles {
        &self.toggles
    }

    pub fn set_toggles(&mut self, toggles: DisplayToggles) {
        self.toggles = toggles.sanitized();
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    pub fn status(&self) -> PlaybackStatus {
        self.clock.status()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.clock.speed()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn round(&self) -> Option<&RoundData> {
        self.round.as_ref()
    }

    pub fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    pub fn frame_index(&self) -> usize {
        self.clock.frame_index()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.round.as_ref().and_then(|r| r.frame(self.clock.frame_index()))
    }

    pub fn progress(&self) -> f64 {
        self.round.as_ref().map(|r| self.clock.progress(r)).unwrap_or(0.0)
    }

    /// Active events at the current tick, filtered by the display toggles.
    /// Empty while no round is loaded.
    pub fn active_events(&self) -> ActiveSet<'_> {
        match &self.round {
            Some(round) => resolve_active(
                round.events(),
                round.metadata().effective_tick_rate(),
                self.clock.current_tick(),
                (&self.toggles).into(),
            ),
            None => ActiveSet::default(),
        }
    }

    /// Build the draw list for the current position, or `None` while no
    /// round is loaded.
    pub fn build_scene(&self, canvas: CanvasSize) -> Option<Scene> {
        self.round.as_ref().map(|round| {
            scene::build(
                round,
                self.clock.frame_index(),
                self.clock.current_tick(),
                self.viewport.viewport(),
                &self.toggles,
                canvas,
            )
        })
    }

    pub fn playback_info(&self) -> PlaybackInfo {
        let (round_number, start_tick, end_tick, total) = match &self.round {
            Some(round) => (
                Some(round.metadata().round_number),
                round.start_tick(),
                round.end_tick(),
                round.metadata().duration_seconds(),
            ),
            None => (None, 0, 0, 0.0),
        };
        let current = match &self.round {
            Some(round) => round.metadata().seconds_at(self.clock.current_tick()),
            None => 0.0,
        };
        PlaybackInfo {
            status: self.clock.status(),
            speed: self.clock.speed(),
            round_number,
            current_tick: self.clock.current_tick(),
            start_tick,
            end_tick,
            current_time_seconds: current,
            total_time_seconds: total,
            progress: self.progress(),
        }
    }

    /// True once since the last state change; the host repaints when it
    /// reads true.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
