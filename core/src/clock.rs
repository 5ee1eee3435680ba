//! Wall-clock abstraction.
//!
//! The investigation timer is anchored to real timestamps, so the core
//! never reads `Utc::now()` directly; everything goes through a shared
//! `GameClock`. Tests swap in a `FixedClock` and move time by hand.

use crate::types::Millis;
use chrono::Utc;
use std::cell::Cell;

pub trait GameClock {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> Millis;
}

/// Production clock backed by the system time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl GameClock for SystemClock {
    fn now_ms(&self) -> Millis {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<Millis>,
}

impl FixedClock {
    pub fn new(start: Millis) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get() + delta);
    }
}

impl GameClock for FixedClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
