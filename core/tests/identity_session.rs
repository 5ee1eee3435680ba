//! Identity and session tests: namespacing, expiry on read, and
//! per-user isolation of the live state.

use mystery_core::{
    clock::FixedClock,
    content::ContentPack,
    engine::GameEngine,
    identity::{self, Identity},
    store::KvStore,
};
use std::rc::Rc;

const T0: i64 = 1_700_000_000_000;
const ONE_HOUR: i64 = 60 * 60 * 1000;

#[test]
fn namespace_falls_back_to_the_anonymous_sentinel() {
    assert_eq!(Identity::anonymous().namespace(), "anonymous");
    assert_eq!(Identity::named("mallory").namespace(), "mallory");
    assert_eq!(Identity::named("mallory").username(), Some("mallory"));
    assert_eq!(Identity::anonymous().username(), None);
}

#[test]
fn a_session_resolves_until_it_expires() {
    let kv = KvStore::in_memory().expect("open");
    kv.migrate().expect("migrate");
    let clock = FixedClock::new(T0);

    identity::open_session(&kv, &clock, "alice", ONE_HOUR).expect("login");
    assert_eq!(
        Identity::from_session(&kv, &clock).expect("resolve"),
        Identity::named("alice")
    );

    clock.advance(ONE_HOUR + 1);
    assert_eq!(
        Identity::from_session(&kv, &clock).expect("resolve"),
        Identity::anonymous()
    );
    // The expired record was removed, not just ignored.
    assert_eq!(kv.get("session").expect("get"), None);
}

#[test]
fn logout_clears_the_session_record() {
    let kv = KvStore::in_memory().expect("open");
    kv.migrate().expect("migrate");
    let clock = FixedClock::new(T0);

    identity::open_session(&kv, &clock, "alice", ONE_HOUR).expect("login");
    assert!(identity::close_session(&kv).expect("logout"));
    assert!(!identity::close_session(&kv).expect("repeat logout"));
    assert!(identity::current_session(&kv, &clock).expect("read").is_none());
}

#[test]
fn each_user_gets_an_isolated_live_state() {
    let path = {
        let dir = std::env::temp_dir().join(format!("mystery-core-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("tempdir");
        dir.join("shared.db").to_string_lossy().into_owned()
    };

    let clock = Rc::new(FixedClock::new(T0));
    {
        let kv = KvStore::open(&path).expect("open");
        let mut alice = GameEngine::open(
            kv,
            ContentPack::builtin(),
            clock.clone(),
            Identity::named("alice"),
        )
        .expect("alice engine");
        alice.start_investigation(None).expect("start");
        alice.collect_item("bloodknife").expect("take");
    }

    let kv = KvStore::open(&path).expect("reopen");
    let bob = GameEngine::open(
        kv,
        ContentPack::builtin(),
        clock.clone(),
        Identity::named("bob"),
    )
    .expect("bob engine");
    assert!(bob.snapshot().inventory.is_empty());

    let kv = KvStore::open(&path).expect("reopen");
    let alice_again = GameEngine::open(
        kv,
        ContentPack::builtin(),
        clock,
        Identity::named("alice"),
    )
    .expect("alice again");
    assert_eq!(alice_again.snapshot().inventory.len(), 1);

    std::fs::remove_file(&path).ok();
}
