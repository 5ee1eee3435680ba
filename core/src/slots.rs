//! Named save slots on top of the KV store.
//!
//! One JSON blob per namespace (`slots::<ns>`) holding the whole slot
//! collection: read the map, mutate in memory, write the map back.
//! Failures are reason-coded values, not exceptions: "slot not found"
//! is a normal answer. No failed operation mutates anything.

use crate::{
    clock::GameClock,
    error::GameError,
    state::GameState,
    store::KvStore,
    types::{Millis, SlotId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

/// The fixed slot count. `list()` always returns exactly this many
/// entries, empty-flagged, so callers never distinguish "absent" from
/// "out of range".
pub const MAX_SLOTS: usize = 5;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("No such slot id")]
    InvalidSlot,

    #[error("Slot is empty")]
    NotFound,

    #[error("Slot belongs to another user")]
    WrongOwner,

    #[error("Slot has no usable game state")]
    CorruptPayload,

    #[error(transparent)]
    Storage(#[from] GameError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSlot {
    pub id:               SlotId,
    pub display_name:     String,
    pub saved_at:         Millis,
    pub room_name:        String,
    pub progress_summary: String,
    pub owner:            String,
    /// `None` for a record whose embedded state was stripped or never
    /// written; such a slot lists normally but refuses to load.
    #[serde(default)]
    pub game_state:       Option<GameState>,
}

/// What `list()` hands to the slot-picker UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot_id:          SlotId,
    pub empty:            bool,
    pub display_name:     Option<String>,
    pub saved_at:         Option<Millis>,
    pub room_name:        Option<String>,
    pub progress_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStats {
    pub namespace:    String,
    pub total_saves:  usize,
    pub last_save_at: Option<Millis>,
}

pub struct SaveSlotManager {
    kv:        Rc<KvStore>,
    clock:     Rc<dyn GameClock>,
    namespace: String,
}

impl SaveSlotManager {
    pub fn new(kv: Rc<KvStore>, clock: Rc<dyn GameClock>, namespace: &str) -> Self {
        Self {
            kv,
            clock,
            namespace: namespace.to_string(),
        }
    }

    pub fn slot_ids() -> impl Iterator<Item = SlotId> {
        (1..=MAX_SLOTS).map(|i| format!("slot_{i}"))
    }

    fn collection_key(&self) -> String {
        format!("slots::{}", self.namespace)
    }

    fn collection(&self) -> Result<BTreeMap<SlotId, SaveSlot>, SlotError> {
        Ok(self
            .kv
            .get_json(&self.collection_key())?
            .unwrap_or_default())
    }

    fn persist(&self, slots: &BTreeMap<SlotId, SaveSlot>) -> Result<(), SlotError> {
        self.kv
            .put_json(&self.collection_key(), slots, self.clock.now_ms())?;
        Ok(())
    }

    fn validate_id(slot_id: &str) -> Result<(), SlotError> {
        if Self::slot_ids().any(|id| id == slot_id) {
            Ok(())
        } else {
            Err(SlotError::InvalidSlot)
        }
    }

    /// Snapshot `state` into `slot_id`, overwriting whatever was there.
    /// Display fields are captured at save time so the slot picker
    /// never has to decode the embedded state.
    pub fn save(
        &self,
        slot_id: &str,
        display_name: Option<&str>,
        state: GameState,
        room_name: String,
        progress_summary: String,
    ) -> Result<SaveSlot, SlotError> {
        Self::validate_id(slot_id)?;
        let slot = SaveSlot {
            id:               slot_id.to_string(),
            display_name:     display_name
                .map(str::to_string)
                .unwrap_or_else(|| default_display_name(slot_id)),
            saved_at:         self.clock.now_ms(),
            room_name,
            progress_summary,
            owner:            self.namespace.clone(),
            game_state:       Some(state),
        };
        let mut slots = self.collection()?;
        slots.insert(slot_id.to_string(), slot.clone());
        self.persist(&slots)?;
        log::debug!("saved '{}' to {slot_id}", slot.display_name);
        Ok(slot)
    }

    /// The stored snapshot, ownership-checked. The caller copies it
    /// into the live state; the slot itself is untouched.
    pub fn load(&self, slot_id: &str) -> Result<(SaveSlot, GameState), SlotError> {
        Self::validate_id(slot_id)?;
        let mut slots = self.collection()?;
        let mut slot = slots.remove(slot_id).ok_or(SlotError::NotFound)?;
        if slot.owner != self.namespace {
            return Err(SlotError::WrongOwner);
        }
        let state = slot.game_state.take().ok_or(SlotError::CorruptPayload)?;
        Ok((slot, state))
    }

    pub fn delete(&self, slot_id: &str) -> Result<(), SlotError> {
        Self::validate_id(slot_id)?;
        let mut slots = self.collection()?;
        let slot = slots.get(slot_id).ok_or(SlotError::NotFound)?;
        if slot.owner != self.namespace {
            return Err(SlotError::WrongOwner);
        }
        slots.remove(slot_id);
        self.persist(&slots)?;
        log::debug!("deleted {slot_id}");
        Ok(())
    }

    /// Fixed-size enumeration: exactly `MAX_SLOTS` summaries.
    pub fn list(&self) -> Result<Vec<SlotSummary>, SlotError> {
        let slots = self.collection()?;
        Ok(Self::slot_ids()
            .map(|slot_id| match slots.get(&slot_id) {
                Some(slot) => SlotSummary {
                    slot_id,
                    empty:            false,
                    display_name:     Some(slot.display_name.clone()),
                    saved_at:         Some(slot.saved_at),
                    room_name:        Some(slot.room_name.clone()),
                    progress_summary: Some(slot.progress_summary.clone()),
                },
                None => SlotSummary {
                    slot_id,
                    empty:            true,
                    display_name:     None,
                    saved_at:         None,
                    room_name:        None,
                    progress_summary: None,
                },
            })
            .collect())
    }

    /// Aggregate save statistics for this namespace.
    pub fn stats(&self) -> Result<SaveStats, SlotError> {
        let slots = self.collection()?;
        Ok(SaveStats {
            namespace:    self.namespace.clone(),
            total_saves:  slots.len(),
            last_save_at: slots.values().map(|s| s.saved_at).max(),
        })
    }
}

fn default_display_name(slot_id: &str) -> String {
    let number = slot_id.rsplit('_').next().unwrap_or(slot_id);
    format!("Save {number}")
}
