//! Shared primitive types used across the entire core.

/// Milliseconds since the Unix epoch, or a millisecond duration.
/// All wall-clock arithmetic in the core happens in this unit.
pub type Millis = i64;

/// A stable identifier for a room in the static room table.
pub type RoomId = String;

/// A stable identifier for a collectible item.
pub type ItemId = String;

/// A stable identifier for a discoverable piece of evidence.
pub type EvidenceId = String;

/// A stable identifier for a memory fragment.
pub type FragmentId = String;

/// A save-slot identifier (`slot_1` .. `slot_5`).
pub type SlotId = String;
