//! The notification surface: every observable thing the core does.
//!
//! RULE: the core never touches the presentation layer directly.
//! It emits `GameEvent`s; whoever is rendering (UI, audio, analytics,
//! the headless runner) subscribes on the `EventBus` and reacts.
//! Payloads carry ids and counts only, never presentation handles.

use crate::types::{EvidenceId, FragmentId, ItemId, Millis, RoomId};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Every event emitted by the core. Variants are added, never reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Progression ────────────────────────────────
    PhaseChanged {
        phase: crate::state::Phase,
    },
    RoomChanged {
        room: RoomId,
        first_visit: bool,
    },
    GameReset,
    StateRestored {
        slot_id: String,
    },

    // ── Collection ─────────────────────────────────
    ItemCollected {
        item_id: ItemId,
        item_count: usize,
    },
    ItemRemoved {
        item_id: ItemId,
    },
    EvidenceFound {
        evidence_id: EvidenceId,
        evidence_count: usize,
    },

    // ── Memory puzzle ──────────────────────────────
    FragmentUnlocked {
        fragment_id: FragmentId,
    },
    FragmentPlaced {
        fragment_id: FragmentId,
        x: u8,
        y: u8,
    },
    PuzzleComplete,

    // ── Investigation clock ────────────────────────
    TimeWarning {
        threshold_ms: Millis,
        remaining_ms: Millis,
    },
    TimeExpired,
    TimeExtended {
        additional_ms: Millis,
    },

    // ── Intuition ──────────────────────────────────
    IntuitionChanged {
        level: u32,
        active: bool,
    },

    // ── Endings ────────────────────────────────────
    ConclusionAvailable,
    EndingTriggered {
        ending_id: crate::ending::EndingId,
        reason: crate::ending::EndingReason,
    },
}

/// Identifies a registered observer so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&GameEvent)>;

/// Synchronous observer registry.
///
/// A panicking observer is caught and logged; the remaining observers
/// still run and state persistence is unaffected.
#[derive(Default)]
pub struct EventBus {
    next_id:   u64,
    observers: Vec<(ObserverId, Observer)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes an observer. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(oid, _)| *oid != id);
    }

    pub fn emit(&mut self, event: &GameEvent) {
        for (id, observer) in &mut self.observers {
            let result = catch_unwind(AssertUnwindSafe(|| observer(event)));
            if result.is_err() {
                log::warn!("observer {id:?} panicked on {event:?}; continuing");
            }
        }
    }
}
