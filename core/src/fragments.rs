//! Memory-fragment puzzle over a fixed 3x3 grid.
//!
//! Fragment definitions (trigger evidence, grid coordinate) are
//! content data; only the unlocked/placed flags are state. Placement
//! validates correctness against the definition. The grid is a
//! reconstruction, not a freeform board.

use crate::{
    content::FragmentDef,
    state::FragmentState,
};

pub const GRID_WIDTH: u8 = 3;
pub const GRID_HEIGHT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed,
    UnknownFragment,
    NotUnlocked,
    AlreadyPlaced,
    WrongPosition,
    /// The playthrough is already over; the request was not applied.
    /// Returned by the engine, never by the board itself.
    Ignored,
}

pub struct FragmentBoard {
    defs: Vec<FragmentDef>,
}

impl FragmentBoard {
    pub fn new(defs: Vec<FragmentDef>) -> Self {
        Self { defs }
    }

    fn def(&self, id: &str) -> Option<&FragmentDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// Make sure `state` has one entry per registered definition, in
    /// registration order. Entries for defs the board does not know
    /// (stale content) are kept but ignored by the queries.
    pub fn ensure_state(&self, state: &mut Vec<FragmentState>) {
        for def in &self.defs {
            if !state.iter().any(|f| f.id == def.id) {
                state.push(FragmentState {
                    id:       def.id.clone(),
                    unlocked: false,
                    placed:   false,
                });
            }
        }
    }

    /// Unlock the first not-yet-unlocked fragment (registration order)
    /// triggered by `evidence_id`. A fragment never unlocks twice.
    pub fn unlock_for_evidence<'a>(
        &'a self,
        state: &mut [FragmentState],
        evidence_id: &str,
    ) -> Option<&'a FragmentDef> {
        for def in &self.defs {
            if def.trigger_evidence != evidence_id {
                continue;
            }
            if let Some(entry) = state.iter_mut().find(|f| f.id == def.id && !f.unlocked) {
                entry.unlocked = true;
                return Some(def);
            }
        }
        None
    }

    /// Place an unlocked fragment. Succeeds only at its predefined
    /// coordinate; everything else leaves the state untouched.
    pub fn place(
        &self,
        state: &mut [FragmentState],
        fragment_id: &str,
        x: u8,
        y: u8,
    ) -> PlaceOutcome {
        let Some(def) = self.def(fragment_id) else {
            return PlaceOutcome::UnknownFragment;
        };
        let Some(entry) = state.iter_mut().find(|f| f.id == fragment_id) else {
            return PlaceOutcome::UnknownFragment;
        };
        if !entry.unlocked {
            return PlaceOutcome::NotUnlocked;
        }
        if entry.placed {
            return PlaceOutcome::AlreadyPlaced;
        }
        if def.position.x != x || def.position.y != y {
            return PlaceOutcome::WrongPosition;
        }
        entry.placed = true;
        PlaceOutcome::Placed
    }

    /// True iff every cell of the grid is occupied by a placed
    /// fragment. Pure query, safe to call as often as you like; the
    /// one-shot completion notification is latched elsewhere
    /// (`GameState.truth_revealed`).
    pub fn is_complete(&self, state: &[FragmentState]) -> bool {
        for y in 0..GRID_HEIGHT {
            for x in 0..GRID_WIDTH {
                let occupied = self.defs.iter().any(|def| {
                    def.position.x == x
                        && def.position.y == y
                        && state.iter().any(|f| f.id == def.id && f.placed)
                });
                if !occupied {
                    return false;
                }
            }
        }
        true
    }
}
