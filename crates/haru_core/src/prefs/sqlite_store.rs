//! SQLite-file key-value store (`kv_entries`).
//!
//! # Invariants
//! - One row per key; `set` overwrites in place and bumps `updated_at`.
//! - Each call is a single statement; there is no cross-key transaction.

use crate::db::DbHandle;
use crate::prefs::{KeyValueStore, PrefResult};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db: Arc<DbHandle>,
}

impl SqliteKeyValueStore {
    /// Wraps a handle opened with `open_preferences*`.
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> PrefResult<Option<Vec<u8>>> {
        self.db.with_conn(|conn| -> PrefResult<Option<Vec<u8>>> {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1;",
                    [key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> PrefResult<()> {
        self.db.with_conn(|conn| -> PrefResult<()> {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT (key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> PrefResult<()> {
        self.db.with_conn(|conn| -> PrefResult<()> {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
            Ok(())
        })
    }
}
