//! Playback clock state machine.
//!
//! The clock owns the current position (a fractional tick plus the derived
//! frame index), the playback status, and the speed multiplier. It is driven
//! by the host's animation loop through [`PlaybackClock::advance`] and never
//! interpolates player positions: the frame index always snaps to the most
//! recent sampled frame at or before the current tick.

use serde::{Deserialize, Serialize};

use crate::models::round::RoundData;

/// Playback state. `Paused` doubles as the "ready" state after a load and
/// the terminal state at the last frame; there is no separate "ended".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Paused,
    Playing,
    Error,
}

/// The closed set of supported speed multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    Quarter,
    Half,
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 5] = [
        PlaybackSpeed::Quarter,
        PlaybackSpeed::Half,
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            PlaybackSpeed::Quarter => 0.25,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
        }
    }

    /// Resolve a raw multiplier back to the enum. Values outside the closed
    /// set return `None`; callers ignore them rather than erroring.
    pub fn from_multiplier(value: f64) -> Option<PlaybackSpeed> {
        PlaybackSpeed::ALL.iter().copied().find(|s| (s.multiplier() - value).abs() < 1e-9)
    }
}

/// Current playback position and status for one loaded round.
///
/// Tick math takes the round by reference; the clock holds no round data
/// itself, so a round switch only needs [`PlaybackClock::attach`].
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    status: PlaybackStatus,
    /// Fractional so that wall-clock advancement at any speed accumulates
    /// without rounding drift.
    current_tick: f64,
    frame_index: usize,
    speed: PlaybackSpeed,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    pub fn new() -> PlaybackClock {
        PlaybackClock {
            status: PlaybackStatus::Idle,
            current_tick: 0.0,
            frame_index: 0,
            speed: PlaybackSpeed::Normal,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick as u64
    }

    pub fn fractional_tick(&self) -> f64 {
        self.current_tick
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn begin_loading(&mut self) {
        self.status = PlaybackStatus::Loading;
        self.current_tick = 0.0;
        self.frame_index = 0;
    }

    pub fn mark_error(&mut self) {
        self.status = PlaybackStatus::Error;
        self.current_tick = 0.0;
        self.frame_index = 0;
    }

    /// Bind to a freshly loaded round: position at frame 0, paused.
    pub fn attach(&mut self, round: &RoundData) {
        self.status = PlaybackStatus::Paused;
        self.current_tick = round.start_tick() as f64;
        self.frame_index = 0;
    }

    /// Returns true if the status changed.
    pub fn play(&mut self) -> bool {
        if self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Playing;
            true
        } else {
            false
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
            true
        } else {
            false
        }
    }

    pub fn toggle_play(&mut self) -> bool {
        match self.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused => self.play(),
            _ => false,
        }
    }

    /// Advance by an elapsed wall-clock delta. Only moves while `Playing`;
    /// clamps at the round's end tick and auto-pauses there. Returns true if
    /// the position moved.
    pub fn advance(&mut self, round: &RoundData, delta_seconds: f64) -> bool {
        if self.status != PlaybackStatus::Playing || !(delta_seconds > 0.0) {
            return false;
        }

        let ticks = delta_seconds * round.metadata().effective_tick_rate() * self.speed.multiplier();
        let end = round.end_tick() as f64;
        let next = (self.current_tick + ticks).min(end);
        let moved = next > self.current_tick;

        self.current_tick = next;
        self.frame_index = round.frame_index_at_tick(self.current_tick as u64);
        if self.current_tick >= end {
            self.status = PlaybackStatus::Paused;
            log::debug!("playback reached end tick {}, pausing", round.end_tick());
        }
        moved
    }

    /// Absolute jump to a frame index, clamped to the valid range. Legal in
    /// any loaded state and does not change play/pause.
    pub fn seek(&mut self, round: &RoundData, frame_index: usize) {
        if !self.has_position() {
            return;
        }
        let index = frame_index.min(round.frame_count() - 1);
        self.frame_index = index;
        // Snapping the tick to the frame keeps seek(i); seek(i) a fixpoint.
        self.current_tick = round.frames()[index].tick as f64;
    }

    /// Jump to a tick, resolving to the most recent frame at or before it.
    pub fn seek_to_tick(&mut self, round: &RoundData, tick: u64) {
        if !self.has_position() {
            return;
        }
        let clamped = round.clamp_tick(tick);
        self.current_tick = clamped as f64;
        self.frame_index = round.frame_index_at_tick(clamped);
    }

    pub fn skip_forward(&mut self, round: &RoundData, seconds: f64) {
        let delta = (seconds.max(0.0) * round.metadata().effective_tick_rate()) as u64;
        self.seek_to_tick(round, self.current_tick().saturating_add(delta));
    }

    pub fn skip_backward(&mut self, round: &RoundData, seconds: f64) {
        let delta = (seconds.max(0.0) * round.metadata().effective_tick_rate()) as u64;
        self.seek_to_tick(round, self.current_tick().saturating_sub(delta));
    }

    /// Manual single-frame step. Pauses playback: frame stepping is an
    /// explicit inspection action.
    pub fn next_frame(&mut self, round: &RoundData) {
        if !self.has_position() {
            return;
        }
        self.pause();
        let index = (self.frame_index + 1).min(round.frame_count() - 1);
        self.seek(round, index);
    }

    pub fn previous_frame(&mut self, round: &RoundData) {
        if !self.has_position() {
            return;
        }
        self.pause();
        let index = self.frame_index.saturating_sub(1);
        self.seek(round, index);
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Set the speed from a raw multiplier. Unrecognized values are ignored
    /// (logged, never a crash). Returns whether the value was accepted.
    pub fn set_speed_multiplier(&mut self, value: f64) -> bool {
        match PlaybackSpeed::from_multiplier(value) {
            Some(speed) => {
                self.speed = speed;
                true
            }
            None => {
                log::debug!("ignoring unsupported playback speed {}", value);
                false
            }
        }
    }

    /// Position within the round as a 0..1 ratio.
    pub fn progress(&self, round: &RoundData) -> f64 {
        let start = round.start_tick() as f64;
        let end = round.end_tick() as f64;
        if end <= start {
            return 1.0;
        }
        ((self.current_tick - start) / (end - start)).clamp(0.0, 1.0)
    }

    fn has_position(&self) -> bool {
        matches!(self.status, PlaybackStatus::Paused | PlaybackStatus::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gen::sample_round;

    fn ready_clock(round: &RoundData) -> PlaybackClock {
        let mut clock = PlaybackClock::new();
        clock.attach(round);
        clock
    }

    #[test]
    fn test_attach_resets_position() {
        let round = sample_round();
        let clock = ready_clock(&round);
        assert_eq!(clock.status(), PlaybackStatus::Paused);
        assert_eq!(clock.frame_index(), 0);
        assert_eq!(clock.current_tick(), 100);
    }

    #[test]
    fn test_advance_requires_playing() {
        let round = sample_round();
        let mut clock = ready_clock(&round);
        assert!(!clock.advance(&round, 1.0));
        assert_eq!(clock.current_tick(), 100);

        clock.play();
        assert!(clock.advance(&round, 1.0));
        // 1s at 64 ticks/s, 1x speed.
        assert_eq!(clock.current_tick(), 164);
        assert_eq!(clock.frame_index(), round.frame_index_at_tick(164));
    }

    #[test]
    fn test_advance_clamps_and_pauses_at_end() {
        let round = sample_round();
        let mut clock = ready_clock(&round);
        clock.play();
        assert!(clock.advance(&round, 3600.0));
        assert_eq!(clock.current_tick(), round.end_tick());
        assert_eq!(clock.frame_index(), round.frame_count() - 1);
        assert_eq!(clock.status(), PlaybackStatus::Paused);

        // Further advancement is a no-op (paused and clamped).
        clock.play();
        assert!(!clock.advance(&round, 1.0));
        assert_eq!(clock.current_tick(), round.end_tick());
    }

    #[test]
    fn test_speed_multiplier_equivalence() {
        let round = sample_round();

        let mut a = ready_clock(&round);
        a.play();
        a.advance(&round, 1.0);

        let mut b = ready_clock(&round);
        b.set_speed(PlaybackSpeed::Double);
        b.play();
        b.advance(&round, 0.5);

        assert_eq!(a.current_tick(), b.current_tick());
    }

    #[test]
    fn test_seek_clamps_and_is_idempotent() {
        let round = sample_round();
        let mut clock = ready_clock(&round);

        clock.seek(&round, 5);
        let first = clock.frame_index();
        clock.seek(&round, 5);
        assert_eq!(clock.frame_index(), first);
        assert_eq!(first, 5);

        clock.seek(&round, round.frame_count() + 5);
        assert_eq!(clock.frame_index(), round.frame_count() - 1);
    }

    #[test]
    fn test_seek_to_tick_holds_last_frame() {
        let round = sample_round();
        let mut clock = ready_clock(&round);

        // Frames at 100, 108, 116, ...: tick 110 resolves to the 108 frame.
        clock.seek_to_tick(&round, 110);
        assert_eq!(clock.frame_index(), 1);
        assert_eq!(round.frames()[clock.frame_index()].tick, 108);
        assert_eq!(clock.current_tick(), 110);
    }

    #[test]
    fn test_seek_to_tick_clamps_to_round_bounds() {
        let round = sample_round();
        let mut clock = ready_clock(&round);

        clock.seek_to_tick(&round, 0);
        assert_eq!(clock.current_tick(), round.start_tick());
        assert_eq!(clock.frame_index(), 0);

        clock.seek_to_tick(&round, u64::MAX);
        assert_eq!(clock.current_tick(), round.end_tick());
    }

    #[test]
    fn test_skip_converts_seconds_to_ticks() {
        let round = sample_round();
        let mut clock = ready_clock(&round);

        clock.skip_forward(&round, 2.0); // 128 ticks at rate 64
        assert_eq!(clock.current_tick(), 228);

        clock.skip_backward(&round, 1.0);
        assert_eq!(clock.current_tick(), 164);

        clock.skip_backward(&round, 3600.0);
        assert_eq!(clock.current_tick(), round.start_tick());
    }

    #[test]
    fn test_frame_step_pauses() {
        let round = sample_round();
        let mut clock = ready_clock(&round);
        clock.play();

        clock.next_frame(&round);
        assert_eq!(clock.status(), PlaybackStatus::Paused);
        assert_eq!(clock.frame_index(), 1);

        clock.previous_frame(&round);
        clock.previous_frame(&round);
        assert_eq!(clock.frame_index(), 0);
    }

    #[test]
    fn test_set_speed_multiplier_rejects_unknown() {
        let mut clock = PlaybackClock::new();
        assert!(clock.set_speed_multiplier(2.0));
        assert_eq!(clock.speed(), PlaybackSpeed::Double);

        assert!(!clock.set_speed_multiplier(3.0));
        assert_eq!(clock.speed(), PlaybackSpeed::Double);
    }

    #[test]
    fn test_commands_noop_before_load() {
        let round = sample_round();
        let mut clock = PlaybackClock::new();

        assert!(!clock.play());
        assert!(!clock.toggle_play());
        clock.seek(&round, 5);
        clock.seek_to_tick(&round, 200);
        clock.next_frame(&round);
        assert_eq!(clock.status(), PlaybackStatus::Idle);
        assert_eq!(clock.frame_index(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: while playing, ticks never decrease and never pass
            /// the round's end tick.
            #[test]
            fn prop_monotonic_playback(deltas in prop::collection::vec(0.0f64..0.5, 1..64)) {
                let round = sample_round();
                let mut clock = ready_clock(&round);
                clock.play();

                let mut last = clock.current_tick();
                for delta in deltas {
                    clock.play();
                    clock.advance(&round, delta);
                    let tick = clock.current_tick();
                    prop_assert!(tick >= last);
                    prop_assert!(tick <= round.end_tick());
                    last = tick;
                }
            }

            /// Property: seeking to any tick resolves to a frame whose tick
            /// does not exceed the (clamped) target.
            #[test]
            fn prop_seek_frame_hold(tick in 0u64..1_000) {
                let round = sample_round();
                let mut clock = ready_clock(&round);
                clock.seek_to_tick(&round, tick);
                let frame_tick = round.frames()[clock.frame_index()].tick;
                prop_assert!(frame_tick <= round.clamp_tick(tick));
            }
        }
    }
}
