//! Time-windowed event visibility.
//!
//! Pure function of `(ledger, tick rate, current tick, filter)`: computes
//! which events are currently active and where each sits in its lifecycle.
//! Holds no state and never mutates the ledger, so the host recomputes it on
//! every tick change (including backward seeks) for a consistent paint.
//!
//! Windows per event family:
//! - kills: 3 s from the kill tick, suppressed when the victim position is
//!   unknown
//! - grenade lifecycle (thrown/smoke/molotov/flash/he/decoy): 5 s
//! - bomb plant: until the next defuse/explode tick (exclusive), open-ended
//!   otherwise; defuse/explode act as point markers while they remain the
//!   most recent bomb event

use serde::Serialize;

use crate::models::events::{BombSite, EventKind, EventLedger, ReplayEvent, WorldPos};

pub const KILL_WINDOW_SECS: f64 = 3.0;
pub const GRENADE_WINDOW_SECS: f64 = 5.0;

/// Fraction of the window spent in each edge stage.
const SPAWNING_RATIO: f64 = 0.1;
const FADING_RATIO: f64 = 0.7;

/// Where an active event sits in its visible lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Spawning,
    Steady,
    Fading,
}

/// Which event families the resolver should consider. Derived from the
/// host's display toggles; bomb events are always resolved (the bomb state
/// has no toggle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryFilter {
    pub kills: bool,
    pub grenades: bool,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        CategoryFilter { kills: true, grenades: true }
    }
}

/// One ledger entry currently inside its visibility window.
#[derive(Debug, Clone)]
pub struct ActiveEvent<'a> {
    pub event: &'a ReplayEvent,
    pub elapsed_ticks: u64,
    /// `None` for open-ended windows (an un-countered bomb plant, a bomb
    /// outcome marker).
    pub window_ticks: Option<u64>,
    pub stage: LifecycleStage,
}

impl ActiveEvent<'_> {
    /// Remaining-lifetime ratio in 1..0; open-ended windows hold at 1. The
    /// renderer applies its own curve on top.
    pub fn fade(&self) -> f32 {
        match self.window_ticks {
            Some(window) if window > 0 => {
                (1.0 - self.elapsed_ticks as f64 / window as f64).clamp(0.0, 1.0) as f32
            }
            _ => 1.0,
        }
    }
}

/// Digest of the round's bomb state at the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BombPhase {
    #[default]
    Clear,
    Planted {
        plant_tick: u64,
        elapsed_ticks: u64,
        pos: WorldPos,
        site: Option<BombSite>,
    },
    Defused {
        at: u64,
        pos: WorldPos,
    },
    Exploded {
        at: u64,
        pos: WorldPos,
    },
}

/// The resolver's output for one tick.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet<'a> {
    pub events: Vec<ActiveEvent<'a>>,
    pub bomb: BombPhase,
}

fn stage_for(elapsed: u64, window: u64) -> LifecycleStage {
    if window == 0 {
        return LifecycleStage::Steady;
    }
    let ratio = elapsed as f64 / window as f64;
    if ratio < SPAWNING_RATIO {
        LifecycleStage::Spawning
    } else if ratio >= FADING_RATIO {
        LifecycleStage::Fading
    } else {
        LifecycleStage::Steady
    }
}

/// Compute the active subset of the ledger at `current_tick`.
pub fn resolve_active<'a>(
    ledger: &'a EventLedger,
    tick_rate: f64,
    current_tick: u64,
    filter: CategoryFilter,
) -> ActiveSet<'a> {
    let tick_rate = if tick_rate > 0.0 { tick_rate } else { 1.0 };
    let kill_window = (KILL_WINDOW_SECS * tick_rate).round() as u64;
    let grenade_window = (GRENADE_WINDOW_SECS * tick_rate).round() as u64;

    let mut events = Vec::new();
    let mut last_bomb: Option<&ReplayEvent> = None;

    for event in ledger.candidates_at(current_tick) {
        let kind = event.kind();
        let elapsed = current_tick - event.tick();

        match kind {
            EventKind::Kill => {
                // Kills with an unknown victim position never render.
                if filter.kills
                    && event.kill_line().is_some()
                    && elapsed < kill_window
                {
                    events.push(ActiveEvent {
                        event,
                        elapsed_ticks: elapsed,
                        window_ticks: Some(kill_window),
                        stage: stage_for(elapsed, kill_window),
                    });
                }
            }
            kind if kind.is_grenade() => {
                if filter.grenades && elapsed < grenade_window {
                    events.push(ActiveEvent {
                        event,
                        elapsed_ticks: elapsed,
                        window_ticks: Some(grenade_window),
                        stage: stage_for(elapsed, grenade_window),
                    });
                }
            }
            kind if kind.is_bomb() => {
                // Candidates are tick-sorted; the last one wins.
                last_bomb = Some(event);
            }
            _ => {}
        }
    }

    let bomb = match last_bomb {
        None => BombPhase::Clear,
        Some(event) => {
            let elapsed = current_tick - event.tick();
            events.push(ActiveEvent {
                event,
                elapsed_ticks: elapsed,
                window_ticks: None,
                stage: LifecycleStage::Steady,
            });
            match event {
                ReplayEvent::BombPlant { base, site, pos, .. } => BombPhase::Planted {
                    plant_tick: base.tick,
                    elapsed_ticks: elapsed,
                    pos: *pos,
                    site: *site,
                },
                ReplayEvent::BombDefuse { base, pos, .. } => {
                    BombPhase::Defused { at: base.tick, pos: *pos }
                }
                ReplayEvent::BombExplode { base, pos } => {
                    BombPhase::Exploded { at: base.tick, pos: *pos }
                }
                _ => BombPhase::Clear,
            }
        }
    };

    ActiveSet { events, bomb }
}
