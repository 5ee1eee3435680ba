//! Investigation countdown.
//!
//! The clock is anchored, not counted: `remaining()` is always
//! recomputed from `investigation_start` and `time_limit_ms`, so a
//! page reload, process restart, or restored save picks up the real
//! elapsed wall-clock time. Nothing here schedules anything; the
//! caller polls `check()` on its own cadence (one second in practice)
//! and reacts to the returned signals.

use crate::{clock::GameClock, state::TimeState, types::Millis};
use std::rc::Rc;

/// Warning points, in milliseconds remaining. Each fires at most once
/// per investigation run.
pub const WARNING_THRESHOLDS: [Millis; 3] = [5 * 60_000, 2 * 60_000, 60_000];

/// Extra time granted when the player chooses to keep digging past the
/// conclusion prompt.
pub const CONTINUE_EXTENSION_MS: Millis = 5 * 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStatus {
    Idle,
    Running,
    Expired,
    Stopped,
}

/// A threshold crossing or expiry observed by `check()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSignal {
    Warning {
        threshold_ms: Millis,
        remaining_ms: Millis,
    },
    Expired,
}

pub struct TimeManager {
    clock: Rc<dyn GameClock>,
}

impl TimeManager {
    pub fn new(clock: Rc<dyn GameClock>) -> Self {
        Self { clock }
    }

    pub fn status(&self, t: &TimeState) -> TimeStatus {
        if t.active {
            TimeStatus::Running
        } else if t.expired {
            TimeStatus::Expired
        } else if t.investigation_start.is_some() {
            TimeStatus::Stopped
        } else {
            TimeStatus::Idle
        }
    }

    /// Begin the countdown. A no-op while already running: a save
    /// restored mid-investigation keeps its original anchor.
    /// Returns whether a fresh run was started.
    pub fn start(&self, t: &mut TimeState) -> bool {
        if t.active {
            log::debug!("investigation clock already running; keeping anchor");
            return false;
        }
        t.investigation_start = Some(self.clock.now_ms());
        t.active = true;
        t.expired = false;
        t.frozen_remaining = None;
        t.warnings_fired.clear();
        log::debug!("investigation started, limit {} ms", t.time_limit_ms);
        true
    }

    /// Milliseconds left. While running this is recomputed from the
    /// anchor; after `stop()` it is frozen at the stop-time value;
    /// before any run it is the full limit.
    pub fn remaining(&self, t: &TimeState) -> Millis {
        if let Some(frozen) = t.frozen_remaining {
            return frozen;
        }
        match t.investigation_start {
            Some(start) if t.active => {
                let elapsed = self.clock.now_ms() - start;
                (t.time_limit_ms - elapsed).max(0)
            }
            Some(_) => 0, // expired without a frozen value
            None => t.time_limit_ms,
        }
    }

    /// Poll the countdown: collects newly crossed warning thresholds,
    /// and on reaching zero performs the terminal expiry transition.
    /// Idle/stopped/expired states return no signals.
    pub fn check(&self, t: &mut TimeState) -> Vec<TimeSignal> {
        if !t.active {
            return Vec::new();
        }
        let remaining = self.remaining(t);
        let mut signals = Vec::new();
        for threshold in WARNING_THRESHOLDS {
            if remaining <= threshold && !t.warnings_fired.contains(&threshold) {
                t.warnings_fired.push(threshold);
                signals.push(TimeSignal::Warning {
                    threshold_ms: threshold,
                    remaining_ms: remaining,
                });
            }
        }
        if remaining <= 0 {
            t.active = false;
            t.expired = true;
            t.frozen_remaining = Some(0);
            signals.push(TimeSignal::Expired);
            log::debug!("investigation time expired");
        }
        signals
    }

    /// Raise the limit (not the anchor), which immediately adds to
    /// `remaining()`. Only meaningful while running.
    pub fn extend(&self, t: &mut TimeState, additional_ms: Millis) -> bool {
        if !t.active {
            return false;
        }
        t.time_limit_ms += additional_ms;
        log::debug!("time limit extended by {additional_ms} ms");
        true
    }

    /// Abandon the run or settle the clock after an ending. The
    /// remaining value is frozen for display and stops counting.
    pub fn stop(&self, t: &mut TimeState) {
        if t.active {
            t.frozen_remaining = Some(self.remaining(t));
            t.active = false;
        }
    }
}
