//! SQLite migration registries and executor.
//!
//! # Responsibility
//! - Register dictionary user-state and preference migrations in strictly
//!   increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic within one registry.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Dictionary migrations only add user-state objects; seed tables are
//!   never rewritten.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    version: u32,
    sql: &'static str,
}

/// Migrations applied on top of the installed seed dictionary.
pub const DICTIONARY_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_user_word_state.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_meaning_order_index.sql"),
    },
];

/// Migrations for the key-value preferences database.
pub const PREFERENCES_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("prefs_0001_kv_entries.sql"),
}];

/// Returns the latest migration version known in `registry`.
pub fn latest_version(registry: &[Migration]) -> u32 {
    registry.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations from `registry` on the provided connection.
pub fn apply_migrations(conn: &mut Connection, registry: &[Migration]) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version(registry);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in registry {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
