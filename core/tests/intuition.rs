//! Intuition-meter tests: time-pressure decay, evidence overload,
//! deactivation at the floor, persistence, and legacy-save defaults.

use mystery_core::{
    clock::FixedClock,
    engine::GameEngine,
    event::GameEvent,
    intuition::{self, IntuitionTier},
    state::{IntuitionState, StateStore},
    store::KvStore,
};
use std::cell::RefCell;
use std::rc::Rc;

const T0: i64 = 1_700_000_000_000;

fn recorded_events(engine: &mut GameEngine) -> Rc<RefCell<Vec<GameEvent>>> {
    let events: Rc<RefCell<Vec<GameEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    engine.on_event(Box::new(move |e| sink.borrow_mut().push(e.clone())));
    events
}

fn discover_range(engine: &mut GameEngine, start: usize, count: usize) {
    for i in start..start + count {
        engine
            .discover_evidence(&format!("lead_{i}"))
            .expect("discover");
    }
}

#[test]
fn a_fresh_run_starts_with_a_full_active_meter() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");

    let snap = engine.snapshot();
    assert_eq!(snap.intuition.level, intuition::FULL_LEVEL);
    assert!(snap.intuition.active);
    assert_eq!(intuition::tier(&snap.intuition), IntuitionTier::High);
}

#[test]
fn warnings_under_five_minutes_each_cost_ten() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    let events = recorded_events(&mut engine);
    engine.start_investigation(None).expect("start");

    // 10:00 remaining, above every threshold: no pressure yet.
    clock.advance(5 * 60_000);
    engine.handle_tick().expect("tick");
    assert_eq!(engine.snapshot().intuition.level, 100);

    // 4:59 remaining crosses the five-minute mark.
    clock.advance(5 * 60_000 + 1_000);
    engine.handle_tick().expect("tick");
    assert_eq!(engine.snapshot().intuition.level, 90);

    // 0:57 remaining: two- and one-minute marks cross together and
    // both charge the meter.
    clock.advance(4 * 60_000 + 2_000);
    engine.handle_tick().expect("tick");
    assert_eq!(engine.snapshot().intuition.level, 70);

    let changes: Vec<u32> = events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            GameEvent::IntuitionChanged { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![90, 70]);
}

#[test]
fn the_first_five_clues_are_free_and_the_rest_cost_five() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");

    discover_range(&mut engine, 0, 5);
    assert_eq!(engine.snapshot().intuition.level, 100);

    discover_range(&mut engine, 5, 3);
    let snap = engine.snapshot();
    assert_eq!(snap.intuition.level, 85);
    assert!(snap.intuition.active);

    // Re-discovering a known clue is a no-op and charges nothing.
    engine.discover_evidence("lead_0").expect("duplicate");
    assert_eq!(engine.snapshot().intuition.level, 85);
}

#[test]
fn dropping_under_the_floor_deactivates_the_meter_for_good() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    let events = recorded_events(&mut engine);
    engine.start_investigation(None).expect("start");

    // Five free clues plus seventeen charged ones land at 15, under
    // the floor of 20.
    discover_range(&mut engine, 0, 22);
    let snap = engine.snapshot();
    assert_eq!(snap.intuition.level, 15);
    assert!(!snap.intuition.active);
    assert_eq!(intuition::tier(&snap.intuition), IntuitionTier::Critical);

    // A dead meter takes no further charges and stays silent.
    let changes_so_far = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GameEvent::IntuitionChanged { .. }))
        .count();
    discover_range(&mut engine, 22, 3);
    assert_eq!(engine.snapshot().intuition.level, 15);
    let changes_after = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GameEvent::IntuitionChanged { .. }))
        .count();
    assert_eq!(changes_after, changes_so_far);
}

#[test]
fn tiers_band_the_level_like_the_display_expects() {
    let band = |level| {
        intuition::tier(&IntuitionState {
            level,
            active: true,
        })
    };
    assert_eq!(band(100), IntuitionTier::High);
    assert_eq!(band(71), IntuitionTier::High);
    assert_eq!(band(70), IntuitionTier::Medium);
    assert_eq!(band(41), IntuitionTier::Medium);
    assert_eq!(band(40), IntuitionTier::Low);
    assert_eq!(band(21), IntuitionTier::Low);
    assert_eq!(band(20), IntuitionTier::Critical);
    assert_eq!(band(0), IntuitionTier::Critical);
}

#[test]
fn the_meter_survives_save_and_restore() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");
    discover_range(&mut engine, 0, 7);
    assert_eq!(engine.snapshot().intuition.level, 90);

    engine.save_slot("slot_1", None).expect("save");
    discover_range(&mut engine, 7, 4);
    assert_eq!(engine.snapshot().intuition.level, 70);

    engine.load_slot("slot_1").expect("load");
    let snap = engine.snapshot();
    assert_eq!(snap.intuition.level, 90);
    assert!(snap.intuition.active);
}

#[test]
fn retry_restores_the_full_meter() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");
    discover_range(&mut engine, 0, 10);
    clock.advance(16 * 60_000);
    engine.handle_tick().expect("tick");
    assert!(engine.snapshot().intuition.level < intuition::FULL_LEVEL);

    engine.retry_investigation().expect("retry");
    let snap = engine.snapshot();
    assert_eq!(snap.intuition.level, intuition::FULL_LEVEL);
    assert!(snap.intuition.active);
}

#[test]
fn a_save_written_before_the_meter_existed_loads_with_the_default() {
    let kv = Rc::new(KvStore::in_memory().expect("kv"));
    kv.migrate().expect("migrate");
    let clock = Rc::new(FixedClock::new(T0));

    // Persist a state blob, then strip the meter field the way an
    // older save would lack it.
    let mut seeded = StateStore::open(kv.clone(), clock.clone(), "anonymous").expect("open");
    seeded.update(|s| s.intuition.level = 35).expect("persist");
    drop(seeded);

    let raw = kv
        .get("game_state::anonymous")
        .expect("get")
        .expect("blob exists");
    let mut blob: serde_json::Value = serde_json::from_str(&raw).expect("parse");
    blob.as_object_mut().expect("object").remove("intuition");
    kv.put("game_state::anonymous", &blob.to_string(), T0)
        .expect("put");

    let reopened = StateStore::open(kv, clock, "anonymous").expect("reopen");
    assert_eq!(
        reopened.snapshot().intuition,
        IntuitionState::default(),
        "missing field defaults to a full meter"
    );
}
