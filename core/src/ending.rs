//! Ending resolution, a pure decision function.
//!
//! RULE: `resolve()` reads a snapshot and returns a verdict. It never
//! mutates anything; the engine applies the verdict (stop the clock,
//! latch the ending, notify) and enforces single-fire via
//! `EndingState.completed`. Time expiry always wins over evidence
//! outcomes evaluated in the same tick.

use serde::{Deserialize, Serialize};

/// How much ordinary evidence closes the case (see DESIGN.md for why
/// this is 5 and not 3).
pub const EVIDENCE_CONCLUDE_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingId {
    /// Ending A: the clock ran out (or the case was dropped early).
    /// Released for lack of memory, never sure of anything.
    Doubt,
    /// Ending B: concluded on the surface evidence, hidden proof
    /// never found.
    WrongfulConviction,
    /// Ending C: hidden evidence found and the memory reconstructed.
    TruthRevealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingReason {
    TimeExpired,
    InsufficientEvidence,
    Abandoned,
    Concluded,
    MemoryRestored,
}

/// Read-only snapshot of everything the resolver may look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndingInput {
    pub time_expired:          bool,
    pub evidence_count:        usize,
    pub hidden_evidence_found: bool,
    pub puzzle_complete:       bool,
    pub conclude_requested:    bool,
    pub abandon_requested:     bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing resolves yet; the investigation continues.
    None,
    /// Enough ordinary evidence to conclude, hidden proof missing:
    /// offer the player the conclude-or-continue choice.
    ConclusionAvailable,
    Ending(EndingId, EndingReason),
}

pub fn resolve(input: &EndingInput) -> Verdict {
    // Expiry precedes every evidence-based outcome in the same tick.
    if input.time_expired {
        return Verdict::Ending(EndingId::Doubt, EndingReason::TimeExpired);
    }

    if input.abandon_requested {
        return if input.evidence_count >= EVIDENCE_CONCLUDE_THRESHOLD {
            Verdict::Ending(EndingId::WrongfulConviction, EndingReason::Abandoned)
        } else {
            Verdict::Ending(EndingId::Doubt, EndingReason::InsufficientEvidence)
        };
    }

    if input.evidence_count >= EVIDENCE_CONCLUDE_THRESHOLD {
        if input.hidden_evidence_found && input.puzzle_complete {
            return Verdict::Ending(EndingId::TruthRevealed, EndingReason::MemoryRestored);
        }
        if !input.hidden_evidence_found {
            return if input.conclude_requested {
                Verdict::Ending(EndingId::WrongfulConviction, EndingReason::Concluded)
            } else {
                Verdict::ConclusionAvailable
            };
        }
        // Hidden evidence in hand, puzzle unfinished: keep digging.
    }

    Verdict::None
}
