//! Inventory and evidence-ledger tests: unique ids, insertion order,
//! idempotent discovery, and the hidden-evidence query.

use mystery_core::{engine::GameEngine, error::GameError, event::GameEvent, inventory};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn duplicate_item_ids_are_rejected() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");

    assert!(engine.collect_item("bloodknife").expect("first pickup"));
    assert!(!engine.collect_item("bloodknife").expect("second pickup"));

    let snap = engine.snapshot();
    assert!(inventory::has_item(&snap, "bloodknife"));
    assert_eq!(inventory::item_count(&snap), 1);
}

#[test]
fn inventory_preserves_discovery_order() {
    let (mut engine, clock) = GameEngine::build_test().expect("build");
    engine.start_investigation(None).expect("start");

    for id in ["insurance", "bloodknife", "tornletter"] {
        clock.advance(1_000);
        engine.collect_item(id).expect("pickup");
    }

    let snap = engine.snapshot();
    let ids: Vec<&str> = snap.inventory.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["insurance", "bloodknife", "tornletter"]);
    assert_eq!(snap.progress.items_collected, 3);
    assert!(snap.inventory[0].obtained_at < snap.inventory[2].obtained_at);
}

#[test]
fn unknown_item_is_an_error_not_a_pickup() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    let err = engine.collect_item("crowbar").unwrap_err();
    assert!(matches!(err, GameError::UnknownItem { .. }));
    assert!(engine.snapshot().inventory.is_empty());
}

#[test]
fn remove_item_filters_by_id_and_tolerates_absence() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.collect_item("insurance").expect("pickup");

    assert!(engine.remove_item("insurance").expect("remove"));
    assert!(!engine.remove_item("insurance").expect("remove again"));
    assert_eq!(engine.snapshot().inventory.len(), 0);
}

#[test]
fn evidence_discovery_is_idempotent() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    let events: Rc<RefCell<Vec<GameEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    engine.on_event(Box::new(move |e| sink.borrow_mut().push(e.clone())));

    assert!(engine.discover_evidence("sofa_stain").expect("discover"));
    assert!(!engine.discover_evidence("sofa_stain").expect("rediscover"));

    let snap = engine.snapshot();
    assert!(inventory::has_evidence(&snap, "sofa_stain"));
    assert_eq!(inventory::evidence_count(&snap), 1);
    assert_eq!(snap.progress.evidence_found, 1);

    let found_events = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, GameEvent::EvidenceFound { .. }))
        .count();
    assert_eq!(found_events, 1);
}

#[test]
fn hidden_evidence_is_detected_by_item_category() {
    let (mut engine, _clock) = GameEngine::build_test().expect("build");
    engine.collect_item("bloodknife").expect("ordinary item");
    assert!(!inventory::hidden_evidence_found(&engine.snapshot()));

    engine.collect_item("hypnosis_receipt").expect("hidden item");
    assert!(inventory::hidden_evidence_found(&engine.snapshot()));
}
