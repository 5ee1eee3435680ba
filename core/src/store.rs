//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Everything else calls KvStore methods; no SQL anywhere else.
//!
//! The store is deliberately shaped like browser local storage: keyed
//! JSON blobs, whole-blob reads and whole-blob writes. Corrupt or
//! missing blobs are treated as absence, so corruption never escapes
//! this boundary as an error (the caller falls back to defaults).

use crate::{error::GameResult, types::Millis};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GameResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_kv.sql"))?;
        Ok(())
    }

    // ── Raw blobs ──────────────────────────────────────────────

    pub fn get(&self, key: &str) -> GameResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str, now_ms: Millis) -> GameResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, now_ms],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> GameResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> GameResult<Vec<String>> {
        // % and _ are LIKE wildcards; a literal prefix must escape both.
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("{escaped}%");
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key")?;
        let keys = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    // ── JSON blobs ─────────────────────────────────────────────

    /// Read and decode a JSON blob. A missing key and an undecodable
    /// blob both come back as `Ok(None)`; the undecodable case is
    /// logged and counts as "no save".
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> GameResult<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                log::warn!("discarding corrupt blob at '{key}': {err}");
                Ok(None)
            }
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T, now_ms: Millis) -> GameResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw, now_ms)
    }
}
