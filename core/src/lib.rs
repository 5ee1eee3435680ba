//! mystery-core: the save/state/progression core of a narrative
//! mystery game.
//!
//! The player explores rooms, collects items and evidence, races a
//! 15-minute investigation clock, reconstructs a memory from puzzle
//! fragments, and lands in one of three endings. This crate owns all
//! of that state and logic; rendering, input, and content authoring
//! live elsewhere and talk to [`engine::GameEngine`] through its
//! action methods and event subscriptions.
//!
//! LAYERING (leaf to root):
//!   store → state → {time, inventory, fragments, intuition, ending, slots} → engine

pub mod clock;
pub mod content;
pub mod ending;
pub mod engine;
pub mod error;
pub mod event;
pub mod fragments;
pub mod identity;
pub mod intuition;
pub mod inventory;
pub mod slots;
pub mod state;
pub mod store;
pub mod time;
pub mod types;
