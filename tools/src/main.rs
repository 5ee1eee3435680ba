//! case-runner: headless driver for the mystery core.
//!
//! Usage:
//!   case-runner --db saves.db --user charlotte
//!   case-runner            (in-memory database, anonymous saves)
//!
//! Reads commands from stdin, one per line, and prints what the core
//! reports back. It is the stand-in for the browser presentation
//! layer: every line maps to exactly one engine call.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use mystery_core::{
    clock::SystemClock,
    content::ContentPack,
    engine::GameEngine,
    event::GameEvent,
    identity::Identity,
    intuition,
    store::KvStore,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let user = args
        .windows(2)
        .find(|w| w[0] == "--user")
        .map(|w| w[1].as_str());
    let content_path = args
        .windows(2)
        .find(|w| w[0] == "--content")
        .map(|w| w[1].as_str());

    let kv = if db == ":memory:" {
        KvStore::in_memory()?
    } else {
        KvStore::open(db)?
    };
    let content = match content_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading content pack {path}"))?;
            serde_json::from_str::<ContentPack>(&raw)
                .with_context(|| format!("parsing content pack {path}"))?
        }
        None => ContentPack::builtin(),
    };
    let identity = match user {
        Some(name) => Identity::named(name),
        None => Identity::anonymous(),
    };

    println!("case-runner (db: {db}, user: {})", identity.namespace());
    println!("type 'help' for commands");

    let mut engine = GameEngine::open(kv, content, Rc::new(SystemClock), identity)?;
    engine.on_event(Box::new(print_event));
    log::debug!("engine ready for '{}'", engine.identity().namespace());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if parts[0] == "quit" {
            break;
        }
        if let Err(err) = dispatch(&mut engine, &parts) {
            println!("error: {err}");
        }
        stdout.flush()?;
    }
    Ok(())
}

fn dispatch(engine: &mut GameEngine, parts: &[&str]) -> Result<()> {
    match parts {
        ["help"] => print_help(),
        ["state"] => print_state(engine),
        ["begin"] => {
            engine.start_investigation(None)?;
        }
        ["phase"] => {
            engine.advance_phase()?;
        }
        ["go", room] => engine.change_room(room)?,
        ["take", item] => {
            if !engine.collect_item(item)? {
                println!("already holding '{item}'");
            }
        }
        ["drop", item] => {
            if !engine.remove_item(item)? {
                println!("not holding '{item}'");
            }
        }
        ["clue", evidence] => {
            if !engine.discover_evidence(evidence)? {
                println!("'{evidence}' already on record");
            }
        }
        ["place", fragment, x, y] => {
            let x: u8 = x.parse().context("x must be 0-2")?;
            let y: u8 = y.parse().context("y must be 0-2")?;
            println!("{:?}", engine.place_fragment(fragment, x, y)?);
        }
        ["tick"] => engine.handle_tick()?,
        ["time"] => {
            let remaining = engine.remaining_ms();
            println!(
                "{:?}: {}:{:02} remaining",
                engine.time_status(),
                remaining / 60_000,
                (remaining % 60_000) / 1000,
            );
        }
        ["conclude"] => {
            engine.conclude_investigation()?;
        }
        ["continue"] => {
            engine.continue_investigation()?;
        }
        ["abandon"] => {
            engine.abandon_investigation()?;
        }
        ["save", slot] => report_slot_op(engine.save_slot(slot, None)),
        ["save", slot, name] => report_slot_op(engine.save_slot(slot, Some(name))),
        ["load", slot] => report_slot_op(engine.load_slot(slot)),
        ["delete", slot] => report_slot_op(engine.delete_slot(slot)),
        ["slots"] => print_slots(engine)?,
        ["reset"] => engine.reset()?,
        ["retry"] => engine.retry_investigation()?,
        _ => println!("unknown command; type 'help'"),
    }
    Ok(())
}

fn report_slot_op(result: std::result::Result<(), mystery_core::slots::SlotError>) {
    match result {
        Ok(()) => println!("ok"),
        Err(err) => println!("refused: {err}"),
    }
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::EvidenceFound {
            evidence_id,
            evidence_count,
        } => println!("* evidence found: {evidence_id} ({evidence_count} total)"),
        GameEvent::ItemCollected { item_id, .. } => println!("* item collected: {item_id}"),
        GameEvent::FragmentUnlocked { fragment_id } => {
            println!("* memory fragment unlocked: {fragment_id}")
        }
        GameEvent::PuzzleComplete => println!("* the memory is whole: truth revealed"),
        GameEvent::TimeWarning { remaining_ms, .. } => {
            println!("* {} minutes left!", remaining_ms / 60_000 + 1)
        }
        GameEvent::TimeExpired => println!("* time is up"),
        GameEvent::IntuitionChanged { level, active } => {
            if *active {
                println!("* intuition wavers ({level})")
            } else {
                println!("* intuition lost")
            }
        }
        GameEvent::ConclusionAvailable => {
            println!("* enough evidence to conclude, or keep digging ('conclude' / 'continue')")
        }
        GameEvent::EndingTriggered { ending_id, reason } => {
            println!("* ENDING: {ending_id:?} ({reason:?})")
        }
        _ => {}
    }
}

fn print_state(engine: &GameEngine) {
    let s = engine.snapshot();
    println!("phase:    {:?}", s.phase);
    println!("room:     {}", s.current_room.as_deref().unwrap_or("-"));
    println!(
        "items:    {}",
        s.inventory
            .iter()
            .map(|i| i.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("clues:    {}", s.evidence.len());
    println!(
        "intuition: {} ({:?}{})",
        s.intuition.level,
        intuition::tier(&s.intuition),
        if s.intuition.active { "" } else { ", lost" },
    );
    println!(
        "puzzle:   {} placed, complete: {}",
        s.memory_fragments.iter().filter(|f| f.placed).count(),
        engine.puzzle_complete(),
    );
    if let Some(ending) = s.ending.current {
        println!("ending:   {ending:?}");
    }
}

fn print_slots(engine: &GameEngine) -> Result<()> {
    for summary in engine.list_slots()? {
        if summary.empty {
            println!("{}: (empty)", summary.slot_id);
        } else {
            let when = summary
                .saved_at
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!(
                "{}: {} - {} - {} ({when})",
                summary.slot_id,
                summary.display_name.unwrap_or_default(),
                summary.room_name.unwrap_or_default(),
                summary.progress_summary.unwrap_or_default(),
            );
        }
    }
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  begin | phase | go <room> | take <item> | drop <item> | clue <id>");
    println!("  place <fragment> <x> <y> | tick | time");
    println!("  conclude | continue | abandon");
    println!("  save <slot> [name] | load <slot> | delete <slot> | slots");
    println!("  state | reset | retry | quit");
}
