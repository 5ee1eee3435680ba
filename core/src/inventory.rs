//! Inventory and evidence-ledger rules.
//!
//! Both collections live in `GameState`; these functions are the only
//! way the engine mutates them, so the invariants sit in one place:
//! item ids are unique and insertion-ordered, the evidence ledger is
//! monotonic, and duplicates are no-ops rather than errors.

use crate::{
    state::{EvidenceRecord, GameState, Item, ItemCategory},
    types::Millis,
};

/// Append `item` unless an item with the same id is already held.
/// Returns whether the inventory changed.
pub fn add_item(state: &mut GameState, item: Item) -> bool {
    if state.inventory.iter().any(|held| held.id == item.id) {
        return false;
    }
    state.inventory.push(item);
    state.progress.items_collected = state.inventory.len();
    true
}

/// Drop the item with `id`. Absent ids are a no-op.
pub fn remove_item(state: &mut GameState, id: &str) -> bool {
    let before = state.inventory.len();
    state.inventory.retain(|held| held.id != id);
    let removed = state.inventory.len() != before;
    if removed {
        state.progress.items_collected = state.inventory.len();
    }
    removed
}

pub fn has_item(state: &GameState, id: &str) -> bool {
    state.inventory.iter().any(|held| held.id == id)
}

pub fn item_count(state: &GameState) -> usize {
    state.inventory.len()
}

/// Flip an evidence id to discovered. Already-discovered ids are a
/// no-op; the ledger never reverts outside a full reset.
pub fn discover_evidence(state: &mut GameState, id: &str, now: Millis) -> bool {
    if state.evidence.contains_key(id) {
        return false;
    }
    state
        .evidence
        .insert(id.to_string(), EvidenceRecord { discovered_at: now });
    state.progress.evidence_found = state.evidence.len();
    true
}

pub fn has_evidence(state: &GameState, id: &str) -> bool {
    state.evidence.contains_key(id)
}

pub fn evidence_count(state: &GameState) -> usize {
    state.evidence.len()
}

/// Whether the bonus evidence is in hand: any held item tagged
/// `HiddenEvidence`. This is what separates the wrongful-conviction
/// path from the true-ending path.
pub fn hidden_evidence_found(state: &GameState) -> bool {
    state
        .inventory
        .iter()
        .any(|held| held.category == ItemCategory::HiddenEvidence)
}
