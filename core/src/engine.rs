//! The game engine, the root object of the mystery core.
//!
//! RULES:
//!   - Presentation never mutates state directly: every user action
//!     comes through an engine method, which funnels the mutation
//!     through the `StateStore` so it is validated, persisted, and
//!     announced in one place.
//!   - The ending resolver runs after every state-relevant mutation
//!     and on every clock poll; time expiry beats evidence outcomes
//!     evaluated in the same tick.
//!   - Once an ending is latched, further progression calls are
//!     logged no-ops until an explicit reset.

use crate::{
    clock::{FixedClock, GameClock},
    content::ContentPack,
    ending::{self, EndingId, EndingInput, Verdict},
    error::{GameError, GameResult},
    event::{EventBus, GameEvent, ObserverId},
    fragments::{FragmentBoard, PlaceOutcome},
    identity::Identity,
    intuition, inventory,
    slots::{SaveSlotManager, SaveStats, SlotError, SlotSummary},
    state::{
        EndingState, GameState, IntuitionState, Phase, ProgressStats, StateStore, SubscriberId,
        TimeState,
    },
    store::KvStore,
    time::{TimeManager, TimeSignal, TimeStatus, CONTINUE_EXTENSION_MS, WARNING_THRESHOLDS},
    types::Millis,
};
use std::rc::Rc;

pub struct GameEngine {
    content:  ContentPack,
    clock:    Rc<dyn GameClock>,
    identity: Identity,
    state:    StateStore,
    time:     TimeManager,
    board:    FragmentBoard,
    slots:    SaveSlotManager,
    bus:      EventBus,
}

impl GameEngine {
    /// Build a fully wired engine over `kv`. Runs migrations, loads
    /// (or defaults) the live state for the identity's namespace, and
    /// syncs fragment registration with the content pack.
    pub fn open(
        kv: KvStore,
        content: ContentPack,
        clock: Rc<dyn GameClock>,
        identity: Identity,
    ) -> GameResult<Self> {
        kv.migrate()?;
        let kv = Rc::new(kv);
        let mut state = StateStore::open(kv.clone(), clock.clone(), identity.namespace())?;
        let board = FragmentBoard::new(content.fragments.clone());
        state.update(|s| board.ensure_state(&mut s.memory_fragments))?;
        let slots = SaveSlotManager::new(kv, clock.clone(), identity.namespace());
        let time = TimeManager::new(clock.clone());
        Ok(Self {
            content,
            clock,
            identity,
            state,
            time,
            board,
            slots,
            bus: EventBus::new(),
        })
    }

    /// In-memory engine on a hand-driven clock. Test construction.
    pub fn build_test() -> GameResult<(Self, Rc<FixedClock>)> {
        let clock = Rc::new(FixedClock::new(1_700_000_000_000));
        let kv = KvStore::in_memory()?;
        let engine = Self::open(
            kv,
            ContentPack::builtin(),
            clock.clone(),
            Identity::anonymous(),
        )?;
        Ok((engine, clock))
    }

    // ── Observation ────────────────────────────────────────────

    pub fn snapshot(&self) -> GameState {
        self.state.snapshot()
    }

    pub fn content(&self) -> &ContentPack {
        &self.content
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn on_event(&mut self, observer: Box<dyn FnMut(&GameEvent)>) -> ObserverId {
        self.bus.subscribe(observer)
    }

    pub fn off_event(&mut self, id: ObserverId) {
        self.bus.unsubscribe(id)
    }

    pub fn subscribe_state(&mut self, subscriber: Box<dyn FnMut(&GameState)>) -> SubscriberId {
        self.state.subscribe(subscriber)
    }

    pub fn unsubscribe_state(&mut self, id: SubscriberId) {
        self.state.unsubscribe(id)
    }

    pub fn remaining_ms(&self) -> Millis {
        self.time.remaining(&self.state.snapshot().time)
    }

    pub fn time_status(&self) -> TimeStatus {
        self.time.status(&self.state.snapshot().time)
    }

    pub fn puzzle_complete(&self) -> bool {
        let snap = self.state.snapshot();
        snap.truth_revealed || self.board.is_complete(&snap.memory_fragments)
    }

    fn terminal(&self) -> bool {
        self.state.snapshot().ending.completed
    }

    // ── Progression ────────────────────────────────────────────

    /// Step to the next narrative phase. Entering the investigation
    /// phase anchors the countdown and places the player in a room.
    pub fn advance_phase(&mut self) -> GameResult<Option<Phase>> {
        if self.terminal() {
            log::debug!("advance_phase ignored: playthrough over");
            return Ok(None);
        }
        let Some(next) = self.state.snapshot().phase.next() else {
            return Ok(None);
        };
        self.state.update(|s| s.phase = next)?;
        self.bus.emit(&GameEvent::PhaseChanged { phase: next });
        if next == Phase::Investigation {
            self.begin_investigation(None)?;
        }
        Ok(Some(next))
    }

    /// Jump straight into the investigation phase (new-game and
    /// load-from-menu paths skip the earlier stages).
    pub fn start_investigation(&mut self, room: Option<&str>) -> GameResult<()> {
        if self.terminal() {
            log::debug!("start_investigation ignored: playthrough over");
            return Ok(());
        }
        let was = self.state.snapshot().phase;
        if was != Phase::Investigation {
            self.state.update(|s| s.phase = Phase::Investigation)?;
            self.bus.emit(&GameEvent::PhaseChanged {
                phase: Phase::Investigation,
            });
        }
        self.begin_investigation(room)
    }

    fn begin_investigation(&mut self, room: Option<&str>) -> GameResult<()> {
        let snap = self.state.snapshot();
        let target = room
            .map(str::to_string)
            .or(snap.current_room)
            .or_else(|| self.default_room());
        if let Some(room_id) = target {
            self.change_room(&room_id)?;
        }
        // No-op for a restored save: the anchor survives.
        let mut started = false;
        self.state.update(|s| started = self.time.start(&mut s.time))?;
        if started {
            log::debug!("investigation clock anchored");
        }
        Ok(())
    }

    fn default_room(&self) -> Option<String> {
        self.content
            .room("living-room")
            .or_else(|| self.content.rooms.first())
            .map(|r| r.id.clone())
    }

    pub fn change_room(&mut self, room_id: &str) -> GameResult<()> {
        if self.terminal() {
            log::debug!("change_room ignored: playthrough over");
            return Ok(());
        }
        if self.content.room(room_id).is_none() {
            return Err(GameError::UnknownRoom {
                id: room_id.to_string(),
            });
        }
        let mut first_visit = false;
        self.state.update(|s| {
            first_visit = !s.progress.rooms_visited.iter().any(|r| r == room_id);
            if first_visit {
                s.progress.rooms_visited.push(room_id.to_string());
            }
            s.current_room = Some(room_id.to_string());
        })?;
        self.bus.emit(&GameEvent::RoomChanged {
            room: room_id.to_string(),
            first_visit,
        });
        Ok(())
    }

    // ── Collection ─────────────────────────────────────────────

    /// Pick up an item defined by the content pack. Duplicate ids are
    /// a no-op and return `false`.
    pub fn collect_item(&mut self, item_id: &str) -> GameResult<bool> {
        if self.terminal() {
            log::debug!("collect_item ignored: playthrough over");
            return Ok(false);
        }
        let def = self
            .content
            .item(item_id)
            .ok_or_else(|| GameError::UnknownItem {
                id: item_id.to_string(),
            })?;
        let item = def.to_item(self.clock.now_ms());
        let mut added = false;
        self.state.update(|s| added = inventory::add_item(s, item))?;
        if added {
            let count = self.state.snapshot().inventory.len();
            self.bus.emit(&GameEvent::ItemCollected {
                item_id:    item_id.to_string(),
                item_count: count,
            });
            self.evaluate_endings(false, false)?;
        }
        Ok(added)
    }

    pub fn remove_item(&mut self, item_id: &str) -> GameResult<bool> {
        let mut removed = false;
        self.state
            .update(|s| removed = inventory::remove_item(s, item_id))?;
        if removed {
            self.bus.emit(&GameEvent::ItemRemoved {
                item_id: item_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Record a discovered clue. Idempotent; a fresh discovery may
    /// also unlock the memory fragment keyed to it.
    pub fn discover_evidence(&mut self, evidence_id: &str) -> GameResult<bool> {
        if self.terminal() {
            log::debug!("discover_evidence ignored: playthrough over");
            return Ok(false);
        }
        let now = self.clock.now_ms();
        let mut discovered = false;
        let mut unlocked: Option<String> = None;
        let mut meter: Option<IntuitionState> = None;
        self.state.update(|s| {
            discovered = inventory::discover_evidence(s, evidence_id, now);
            if discovered {
                unlocked = self
                    .board
                    .unlock_for_evidence(&mut s.memory_fragments, evidence_id)
                    .map(|def| def.id.clone());
                // A crowded ledger wears the intuition meter down.
                if s.evidence.len() > intuition::EVIDENCE_OVERLOAD_THRESHOLD
                    && intuition::decay(&mut s.intuition, intuition::EVIDENCE_OVERLOAD_DECAY)
                {
                    meter = Some(s.intuition);
                }
            }
        })?;
        if discovered {
            let count = self.state.snapshot().evidence.len();
            self.bus.emit(&GameEvent::EvidenceFound {
                evidence_id:    evidence_id.to_string(),
                evidence_count: count,
            });
            if let Some(fragment_id) = unlocked {
                self.bus.emit(&GameEvent::FragmentUnlocked { fragment_id });
            }
            self.emit_intuition(meter);
            self.evaluate_endings(false, false)?;
        }
        Ok(discovered)
    }

    // ── Memory puzzle ──────────────────────────────────────────

    /// Place an unlocked fragment at `(x, y)`. Filling the last grid
    /// cell latches `truth_revealed` and fires the completion
    /// notification exactly once.
    pub fn place_fragment(&mut self, fragment_id: &str, x: u8, y: u8) -> GameResult<PlaceOutcome> {
        if self.terminal() {
            log::debug!("place_fragment ignored: playthrough over");
            return Ok(PlaceOutcome::Ignored);
        }
        let mut outcome = PlaceOutcome::Ignored;
        let mut completed = false;
        self.state.update(|s| {
            outcome = self.board.place(&mut s.memory_fragments, fragment_id, x, y);
            if outcome == PlaceOutcome::Placed
                && !s.truth_revealed
                && self.board.is_complete(&s.memory_fragments)
            {
                s.truth_revealed = true;
                completed = true;
            }
        })?;
        if outcome == PlaceOutcome::Placed {
            self.bus.emit(&GameEvent::FragmentPlaced {
                fragment_id: fragment_id.to_string(),
                x,
                y,
            });
        }
        if completed {
            self.bus.emit(&GameEvent::PuzzleComplete);
            self.evaluate_endings(false, false)?;
        }
        Ok(outcome)
    }

    // ── Clock ──────────────────────────────────────────────────

    /// The 1-second cadence hook. Settles warnings and expiry, then
    /// re-runs ending resolution.
    pub fn handle_tick(&mut self) -> GameResult<()> {
        if self.terminal() {
            return Ok(());
        }
        self.evaluate_endings(false, false)?;
        Ok(())
    }

    pub fn extend_time(&mut self, additional_ms: Millis) -> GameResult<bool> {
        let mut applied = false;
        self.state
            .update(|s| applied = self.time.extend(&mut s.time, additional_ms))?;
        if applied {
            self.bus.emit(&GameEvent::TimeExtended { additional_ms });
        }
        Ok(applied)
    }

    fn poll_time(&mut self) -> GameResult<()> {
        if !self.state.snapshot().time.active {
            return Ok(());
        }
        let mut signals = Vec::new();
        let mut meter: Option<IntuitionState> = None;
        self.state.update(|s| {
            signals = self.time.check(&mut s.time);
            // Each warning under five minutes on the clock is pressure
            // the intuition meter pays for.
            let pressured = signals
                .iter()
                .filter(|sig| {
                    matches!(sig, TimeSignal::Warning { remaining_ms, .. }
                        if *remaining_ms < WARNING_THRESHOLDS[0])
                })
                .count();
            for _ in 0..pressured {
                if intuition::decay(&mut s.intuition, intuition::TIME_PRESSURE_DECAY) {
                    meter = Some(s.intuition);
                }
            }
        })?;
        for signal in signals {
            match signal {
                TimeSignal::Warning {
                    threshold_ms,
                    remaining_ms,
                } => self.bus.emit(&GameEvent::TimeWarning {
                    threshold_ms,
                    remaining_ms,
                }),
                TimeSignal::Expired => self.bus.emit(&GameEvent::TimeExpired),
            }
        }
        self.emit_intuition(meter);
        Ok(())
    }

    fn emit_intuition(&mut self, meter: Option<IntuitionState>) {
        if let Some(m) = meter {
            self.bus.emit(&GameEvent::IntuitionChanged {
                level:  m.level,
                active: m.active,
            });
        }
    }

    // ── Endings ────────────────────────────────────────────────

    /// The player closes the case on the evidence in hand.
    pub fn conclude_investigation(&mut self) -> GameResult<Option<EndingId>> {
        self.evaluate_endings(true, false)
    }

    /// The player walks away from the conclusion prompt to keep
    /// digging: hidden-evidence search opens up and the clock gains
    /// five minutes. Only valid as an answer to the prompt; before it
    /// has been offered this is a no-op. Idempotent.
    pub fn continue_investigation(&mut self) -> GameResult<bool> {
        if self.terminal() {
            return Ok(false);
        }
        let snap = self.state.snapshot();
        if !snap.ending.conclusion_offered {
            log::debug!("continue_investigation ignored: conclusion never offered");
            return Ok(false);
        }
        if snap.ending.hidden_search_enabled {
            return Ok(false);
        }
        let mut extended = false;
        self.state.update(|s| {
            s.ending.hidden_search_enabled = true;
            extended = self.time.extend(&mut s.time, CONTINUE_EXTENSION_MS);
        })?;
        if extended {
            self.bus.emit(&GameEvent::TimeExtended {
                additional_ms: CONTINUE_EXTENSION_MS,
            });
        }
        log::debug!("hidden-evidence search enabled");
        Ok(true)
    }

    /// The player abandons the investigation outright.
    pub fn abandon_investigation(&mut self) -> GameResult<Option<EndingId>> {
        self.evaluate_endings(false, true)
    }

    /// Run the pure resolver over the current snapshot and apply its
    /// verdict. Single-fire: a latched ending short-circuits every
    /// later call, whatever the inputs.
    fn evaluate_endings(
        &mut self,
        conclude_requested: bool,
        abandon_requested: bool,
    ) -> GameResult<Option<EndingId>> {
        let snap = self.state.snapshot();
        if snap.ending.completed {
            log::debug!("ending already resolved; evaluation ignored");
            return Ok(snap.ending.current);
        }

        // Settle the clock first so expiry wins this tick.
        self.poll_time()?;

        let s = self.state.snapshot();
        let input = EndingInput {
            time_expired:          s.time.expired,
            evidence_count:        s.evidence.len(),
            hidden_evidence_found: inventory::hidden_evidence_found(&s),
            puzzle_complete:       s.truth_revealed
                || self.board.is_complete(&s.memory_fragments),
            conclude_requested,
            abandon_requested,
        };

        match ending::resolve(&input) {
            Verdict::None => Ok(None),
            Verdict::ConclusionAvailable => {
                if !s.ending.conclusion_offered {
                    self.state.update(|st| st.ending.conclusion_offered = true)?;
                    self.bus.emit(&GameEvent::ConclusionAvailable);
                }
                Ok(None)
            }
            Verdict::Ending(ending_id, reason) => {
                self.state.update(|st| {
                    self.time.stop(&mut st.time);
                    st.ending.current = Some(ending_id);
                    st.ending.reason = Some(reason);
                    st.ending.completed = true;
                })?;
                log::debug!("ending {ending_id:?} triggered ({reason:?})");
                self.bus.emit(&GameEvent::EndingTriggered { ending_id, reason });
                Ok(Some(ending_id))
            }
        }
    }

    // ── Save slots ─────────────────────────────────────────────

    pub fn save_slot(
        &mut self,
        slot_id: &str,
        display_name: Option<&str>,
    ) -> Result<(), SlotError> {
        let snap = self.state.snapshot();
        let room_name = snap
            .current_room
            .as_deref()
            .map(|id| self.content.room_name(id))
            .unwrap_or_else(|| "-".to_string());
        let progress_summary = format!(
            "Items {}/{} · Clues {}",
            snap.inventory.len(),
            self.content.items.len(),
            snap.evidence.len(),
        );
        self.slots
            .save(slot_id, display_name, snap, room_name, progress_summary)?;
        Ok(())
    }

    /// Replace the live state with a slot's snapshot and resync the
    /// derived caches. The countdown needs no repair; `remaining()`
    /// is recomputed from the restored anchor.
    pub fn load_slot(&mut self, slot_id: &str) -> Result<(), SlotError> {
        let (_slot, restored) = self.slots.load(slot_id)?;
        self.state.replace(restored).map_err(SlotError::from)?;
        self.state
            .update(|s| self.board.ensure_state(&mut s.memory_fragments))
            .map_err(SlotError::from)?;
        self.bus.emit(&GameEvent::StateRestored {
            slot_id: slot_id.to_string(),
        });
        Ok(())
    }

    pub fn delete_slot(&mut self, slot_id: &str) -> Result<(), SlotError> {
        self.slots.delete(slot_id)
    }

    pub fn list_slots(&self) -> Result<Vec<SlotSummary>, SlotError> {
        self.slots.list()
    }

    pub fn slot_stats(&self) -> Result<SaveStats, SlotError> {
        self.slots.stats()
    }

    // ── Reset ──────────────────────────────────────────────────

    /// New game: everything back to the documented defaults under a
    /// fresh playthrough id.
    pub fn reset(&mut self) -> GameResult<()> {
        let initial = GameState::initial(self.clock.now_ms());
        self.state.replace(initial)?;
        self.state
            .update(|s| self.board.ensure_state(&mut s.memory_fragments))?;
        self.bus.emit(&GameEvent::GameReset);
        Ok(())
    }

    /// Retry from the start of the investigation: collections,
    /// fragments, ending latch, and clock anchor all cleared, same
    /// playthrough.
    pub fn retry_investigation(&mut self) -> GameResult<()> {
        self.state.update(|s| {
            s.phase = Phase::Investigation;
            s.inventory.clear();
            s.evidence.clear();
            for fragment in &mut s.memory_fragments {
                fragment.unlocked = false;
                fragment.placed = false;
            }
            s.truth_revealed = false;
            s.ending = EndingState::default();
            s.time = TimeState::default();
            s.intuition = IntuitionState::default();
            s.progress = ProgressStats::default();
        })?;
        self.bus.emit(&GameEvent::GameReset);
        self.begin_investigation(None)
    }
}
