//! User identity and the toy session record.
//!
//! The core never authenticates anyone. It consumes a stable username
//! (or the anonymous sentinel) to namespace saves, and it can read or
//! write the simple session blob the login screen maintains. Expired
//! sessions read back as absent.

use crate::{clock::GameClock, error::GameResult, store::KvStore, types::Millis};
use serde::{Deserialize, Serialize};

/// Namespace used when nobody is logged in. Saves under it are shared.
pub const ANONYMOUS_NAMESPACE: &str = "anonymous";

const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: Option<String>,
}

impl Identity {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { username: None }
    }

    /// Resolve the identity from the persisted session, anonymous if
    /// no live session exists.
    pub fn from_session(kv: &KvStore, clock: &dyn GameClock) -> GameResult<Self> {
        Ok(match current_session(kv, clock)? {
            Some(session) => Self::named(session.username),
            None => Self::anonymous(),
        })
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The stable string all persisted keys are suffixed with.
    pub fn namespace(&self) -> &str {
        self.username.as_deref().unwrap_or(ANONYMOUS_NAMESPACE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username:     String,
    pub logged_in_at: Millis,
    pub expires_at:   Millis,
}

/// The live session, if any. Expired records are dropped on read.
pub fn current_session(kv: &KvStore, clock: &dyn GameClock) -> GameResult<Option<SessionRecord>> {
    let Some(session) = kv.get_json::<SessionRecord>(SESSION_KEY)? else {
        return Ok(None);
    };
    if clock.now_ms() > session.expires_at {
        log::debug!("session for '{}' expired; clearing", session.username);
        kv.remove(SESSION_KEY)?;
        return Ok(None);
    }
    Ok(Some(session))
}

pub fn open_session(
    kv: &KvStore,
    clock: &dyn GameClock,
    username: &str,
    ttl_ms: Millis,
) -> GameResult<SessionRecord> {
    let now = clock.now_ms();
    let session = SessionRecord {
        username:     username.to_string(),
        logged_in_at: now,
        expires_at:   now + ttl_ms,
    };
    kv.put_json(SESSION_KEY, &session, now)?;
    Ok(session)
}

pub fn close_session(kv: &KvStore) -> GameResult<bool> {
    kv.remove(SESSION_KEY)
}
