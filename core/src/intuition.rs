//! Detective-intuition meter.
//!
//! A pressure mechanic layered over the investigation: the meter
//! starts full and only ever decays. Warnings fired with under five
//! minutes on the clock and an overloaded evidence ledger wear it
//! down; once it drops under the floor it cuts out for the rest of
//! the run. The presentation layer reads the level and active flag to
//! drive its choice highlighting; none of that rendering lives here.

use crate::state::IntuitionState;

pub const FULL_LEVEL: u32 = 100;
/// Below this the meter deactivates outright.
pub const ACTIVE_FLOOR: u32 = 20;
/// Cost of each time warning fired with under five minutes left.
pub const TIME_PRESSURE_DECAY: u32 = 10;
/// Cost of each clue recorded past the overload threshold.
pub const EVIDENCE_OVERLOAD_DECAY: u32 = 5;
pub const EVIDENCE_OVERLOAD_THRESHOLD: usize = 5;

/// Display band for the meter, coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntuitionTier {
    High,
    Medium,
    Low,
    Critical,
}

/// Lower the meter by `amount`, clamped at zero. Dropping under the
/// floor deactivates it until a fresh run. Returns whether anything
/// changed; an inactive meter never does.
pub fn decay(state: &mut IntuitionState, amount: u32) -> bool {
    if !state.active || amount == 0 {
        return false;
    }
    state.level = state.level.saturating_sub(amount);
    if state.level < ACTIVE_FLOOR {
        state.active = false;
        log::debug!("intuition cut out at level {}", state.level);
    }
    true
}

pub fn tier(state: &IntuitionState) -> IntuitionTier {
    if state.level > 70 {
        IntuitionTier::High
    } else if state.level > 40 {
        IntuitionTier::Medium
    } else if state.level > ACTIVE_FLOOR {
        IntuitionTier::Low
    } else {
        IntuitionTier::Critical
    }
}
