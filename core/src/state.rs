//! The canonical game state and its store.
//!
//! RULE: `GameState` is the single source of truth. There is exactly
//! one live copy, owned by the `StateStore`; everyone else gets clones.
//! All mutation goes through `patch`/`update`/`replace` so the
//! invariants (monotonic evidence, unique item ids, terminal endings)
//! are enforced in one place and every successful write is persisted
//! and announced to subscribers.

use crate::{
    clock::GameClock,
    ending::{EndingId, EndingReason},
    error::GameResult,
    store::KvStore,
    types::{EvidenceId, FragmentId, ItemId, Millis, RoomId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use uuid::Uuid;

/// Current save-blob schema version.
pub const STATE_VERSION: u32 = 1;

/// Default investigation limit: 15 minutes.
pub const DEFAULT_TIME_LIMIT_MS: Millis = 15 * 60 * 1000;

/// Top-level narrative stage. Strictly linear; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Dream,
    PoliceCar,
    Investigation,
}

impl Phase {
    /// The stage after this one, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Dream => Some(Phase::PoliceCar),
            Phase::PoliceCar => Some(Phase::Investigation),
            Phase::Investigation => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Evidence,
    Document,
    Tool,
    Key,
    /// The bonus evidence that opens the true-ending path.
    HiddenEvidence,
}

/// A collectible object with display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id:          ItemId,
    pub name:        String,
    pub icon:        String,
    pub description: String,
    pub category:    ItemCategory,
    pub obtained_at: Millis,
}

/// A discovered clue. Distinct from an `Item`; once present it never
/// reverts (except on full game reset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub discovered_at: Millis,
}

/// Persistent flags for one memory fragment. The fragment's trigger
/// evidence and grid position are content data (`FragmentDef`), not
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentState {
    pub id:       FragmentId,
    pub unlocked: bool,
    pub placed:   bool,
}

/// Investigation-clock state. The countdown is never stored, only the
/// anchor timestamp and the limit, so elapsed wall-clock time survives
/// reloads unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeState {
    pub investigation_start: Option<Millis>,
    pub time_limit_ms:       Millis,
    /// Warning thresholds (ms remaining) already fired this run.
    pub warnings_fired:      Vec<Millis>,
    pub active:              bool,
    /// Terminal for the run: the limit ran out while active.
    pub expired:             bool,
    /// Remaining time captured at `stop()`, for display after the run.
    pub frozen_remaining:    Option<Millis>,
}

impl Default for TimeState {
    fn default() -> Self {
        Self {
            investigation_start: None,
            time_limit_ms:       DEFAULT_TIME_LIMIT_MS,
            warnings_fired:      Vec::new(),
            active:              false,
            expired:             false,
            frozen_remaining:    None,
        }
    }
}

/// Detective-intuition meter: starts full, only decays, cuts out for
/// the run once it falls under the floor. Decay rules live in the
/// `intuition` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntuitionState {
    pub level:  u32,
    pub active: bool,
}

impl Default for IntuitionState {
    fn default() -> Self {
        Self {
            level:  crate::intuition::FULL_LEVEL,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndingState {
    pub current:               Option<EndingId>,
    pub reason:                Option<EndingReason>,
    pub completed:             bool,
    /// Set when the player chooses to keep digging past the
    /// conclusion prompt; unlocks hidden-evidence interactables.
    pub hidden_search_enabled: bool,
    /// The conclusion prompt is offered at most once per run.
    pub conclusion_offered:    bool,
}

/// Derived display counters, kept in sync by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub items_collected: usize,
    pub evidence_found:  usize,
    pub rooms_visited:   Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub version:        u32,
    pub playthrough_id: String,
    pub created_at:     Millis,
    pub updated_at:     Millis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub phase:            Phase,
    pub current_room:     Option<RoomId>,
    pub inventory:        Vec<Item>,
    pub evidence:         BTreeMap<EvidenceId, EvidenceRecord>,
    pub memory_fragments: Vec<FragmentState>,
    /// Latched the first time the puzzle grid fills; the completion
    /// notification fires exactly once because of this flag.
    pub truth_revealed:   bool,
    pub time:             TimeState,
    pub ending:           EndingState,
    /// Defaulted when absent so saves written before the meter existed
    /// still load.
    #[serde(default)]
    pub intuition:        IntuitionState,
    pub progress:         ProgressStats,
    pub meta:             Meta,
}

impl GameState {
    /// The documented fallback state: fresh playthrough at the dream
    /// stage, empty collections, default 15-minute limit.
    pub fn initial(now: Millis) -> Self {
        Self {
            phase:            Phase::Dream,
            current_room:     None,
            inventory:        Vec::new(),
            evidence:         BTreeMap::new(),
            memory_fragments: Vec::new(),
            truth_revealed:   false,
            time:             TimeState::default(),
            ending:           EndingState::default(),
            intuition:        IntuitionState::default(),
            progress:         ProgressStats::default(),
            meta:             Meta {
                version:        STATE_VERSION,
                playthrough_id: Uuid::new_v4().to_string(),
                created_at:     now,
                updated_at:     now,
            },
        }
    }
}

/// Optional-field shallow merge over the top-level `GameState` fields.
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub phase:            Option<Phase>,
    pub current_room:     Option<RoomId>,
    pub inventory:        Option<Vec<Item>>,
    pub evidence:         Option<BTreeMap<EvidenceId, EvidenceRecord>>,
    pub memory_fragments: Option<Vec<FragmentState>>,
    pub truth_revealed:   Option<bool>,
    pub time:             Option<TimeState>,
    pub ending:           Option<EndingState>,
    pub intuition:        Option<IntuitionState>,
    pub progress:         Option<ProgressStats>,
}

impl StatePatch {
    fn apply(self, state: &mut GameState) {
        if let Some(v) = self.phase            { state.phase = v; }
        if let Some(v) = self.current_room     { state.current_room = Some(v); }
        if let Some(v) = self.inventory        { state.inventory = v; }
        if let Some(v) = self.evidence         { state.evidence = v; }
        if let Some(v) = self.memory_fragments { state.memory_fragments = v; }
        if let Some(v) = self.truth_revealed   { state.truth_revealed = v; }
        if let Some(v) = self.time             { state.time = v; }
        if let Some(v) = self.ending           { state.ending = v; }
        if let Some(v) = self.intuition        { state.intuition = v; }
        if let Some(v) = self.progress         { state.progress = v; }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&GameState)>;

pub struct StateStore {
    kv:          Rc<KvStore>,
    clock:       Rc<dyn GameClock>,
    key:         String,
    state:       GameState,
    next_sub:    u64,
    subscribers: Vec<(SubscriberId, Subscriber)>,
}

impl StateStore {
    /// Load the live state for `namespace`, falling back to the
    /// documented default when nothing usable is persisted. Corrupt
    /// blobs never fail startup; they count as "no save".
    pub fn open(kv: Rc<KvStore>, clock: Rc<dyn GameClock>, namespace: &str) -> GameResult<Self> {
        let key = state_key(namespace);
        let state = match kv.get_json::<GameState>(&key)? {
            Some(state) => {
                log::debug!("restored state for '{namespace}' (phase {:?})", state.phase);
                state
            }
            None => GameState::initial(clock.now_ms()),
        };
        Ok(Self {
            kv,
            clock,
            key,
            state,
            next_sub: 0,
            subscribers: Vec::new(),
        })
    }

    /// A deep, independent copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Shallow-merge `patch`, bump `meta.updated_at`, persist, notify.
    pub fn patch(&mut self, patch: StatePatch) -> GameResult<()> {
        let mut next = self.state.clone();
        patch.apply(&mut next);
        self.commit(next)
    }

    /// Functional variant of `patch`: read → transform → commit in one
    /// synchronous call, so derived mutations never act on a stale
    /// snapshot.
    pub fn update(&mut self, f: impl FnOnce(&mut GameState)) -> GameResult<()> {
        let mut next = self.state.clone();
        f(&mut next);
        self.commit(next)
    }

    /// Full overwrite, the slot-load path.
    pub fn replace(&mut self, state: GameState) -> GameResult<()> {
        self.commit(state)
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) -> SubscriberId {
        let id = SubscriberId(self.next_sub);
        self.next_sub += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn commit(&mut self, mut next: GameState) -> GameResult<()> {
        next.meta.updated_at = self.clock.now_ms();
        self.kv.put_json(&self.key, &next, next.meta.updated_at)?;
        self.state = next;
        for (id, subscriber) in &mut self.subscribers {
            let result = catch_unwind(AssertUnwindSafe(|| subscriber(&self.state)));
            if result.is_err() {
                log::warn!("state subscriber {id:?} panicked; continuing");
            }
        }
        Ok(())
    }
}

pub fn state_key(namespace: &str) -> String {
    format!("game_state::{namespace}")
}
