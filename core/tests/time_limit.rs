//! Investigation-clock tests: anchor-based remaining time, warning
//! thresholds, expiry, extension, and survival across save/restore.

use mystery_core::{
    ending::{EndingId, EndingReason},
    engine::GameEngine,
    event::GameEvent,
    time::TimeStatus,
};
use std::cell::RefCell;
use std::rc::Rc;

const LIMIT: i64 = 15 * 60 * 1000;

fn recorded_events(engine: &mut GameEngine) -> Rc<RefCell<Vec<GameEvent>>> {
    let events: Rc<RefCell<Vec<GameEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    engine.on_event(Box::new(move |e| sink.borrow_mut().push(e.clone())));
    events
}

#[test]
fn remaining_is_computed_from_the_anchor() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    let t0 = 1_700_000_000_000;
    engine.start_investigation(None).expect("start");

    clock.set(t0 + 899_999);
    assert_eq!(engine.remaining_ms(), 1);

    clock.set(t0 + 900_001);
    assert_eq!(engine.remaining_ms(), 0);
}

#[test]
fn expiry_is_terminal_and_triggers_the_timeout_ending() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    let events = recorded_events(&mut engine);
    engine.start_investigation(None).expect("start");

    clock.advance(LIMIT + 1);
    engine.handle_tick().expect("tick");

    assert_eq!(engine.time_status(), TimeStatus::Expired);
    let snap = engine.snapshot();
    assert_eq!(snap.ending.current, Some(EndingId::Doubt));
    assert_eq!(snap.ending.reason, Some(EndingReason::TimeExpired));
    assert!(snap.ending.completed);
    assert!(events
        .borrow()
        .iter()
        .any(|e| matches!(e, GameEvent::TimeExpired)));
}

#[test]
fn each_warning_threshold_fires_exactly_once() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    let events = recorded_events(&mut engine);
    engine.start_investigation(None).expect("start");

    // 10:00 remaining, above every threshold.
    clock.advance(5 * 60_000);
    engine.handle_tick().expect("tick");

    // 4:59 remaining crosses the five-minute mark.
    clock.advance(5 * 60_000 + 1_000);
    engine.handle_tick().expect("tick");
    engine.handle_tick().expect("tick again");

    let five_minute_warnings = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GameEvent::TimeWarning { threshold_ms, .. } if *threshold_ms == 300_000))
        .count();
    assert_eq!(five_minute_warnings, 1);

    // 0:57 remaining: two- and one-minute marks cross together.
    clock.advance(4 * 60_000 + 2_000);
    engine.handle_tick().expect("tick");
    let warnings = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GameEvent::TimeWarning { .. }))
        .count();
    assert_eq!(warnings, 3);
}

#[test]
fn start_while_running_keeps_the_original_anchor() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");
    let anchor = engine.snapshot().time.investigation_start;

    clock.advance(60_000);
    engine.start_investigation(None).expect("restart attempt");
    assert_eq!(engine.snapshot().time.investigation_start, anchor);
    assert_eq!(engine.remaining_ms(), LIMIT - 60_000);
}

#[test]
fn restored_save_reflects_real_elapsed_wall_clock_time() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");
    engine.save_slot("slot_1", None).expect("save");

    // Fourteen minutes pass while the save sits on disk.
    clock.advance(14 * 60_000);
    engine.load_slot("slot_1").expect("load");

    assert_eq!(engine.time_status(), TimeStatus::Running);
    assert_eq!(engine.remaining_ms(), 60_000);
}

#[test]
fn extend_raises_remaining_while_running_only() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    assert!(!engine.extend_time(60_000).expect("extend while idle"));

    engine.start_investigation(None).expect("start");
    clock.advance(60_000);
    assert!(engine.extend_time(120_000).expect("extend"));
    assert_eq!(engine.remaining_ms(), LIMIT - 60_000 + 120_000);
}

#[test]
fn stop_freezes_remaining_for_display() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");

    clock.advance(5 * 60_000);
    // Abandoning resolves an ending, which stops the clock.
    engine.abandon_investigation().expect("abandon");
    assert_eq!(engine.time_status(), TimeStatus::Stopped);
    assert_eq!(engine.remaining_ms(), LIMIT - 5 * 60_000);

    clock.advance(60_000);
    assert_eq!(engine.remaining_ms(), LIMIT - 5 * 60_000, "frozen after stop");
}
