//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Install the bundled seed into writable storage (first run, forced
//!   reinstall, or one-shot schema recovery).
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable handle.
//!
//! # Invariants
//! - Returned handles have `foreign_keys=ON` and migrations fully applied.
//! - A schema mismatch is repaired by recopying the seed at most once.

use super::handle::DbHandle;
use super::migrations::{apply_migrations, DICTIONARY_MIGRATIONS, PREFERENCES_MIGRATIONS};
use super::seed::{
    create_seed_schema, table_exists, verify_seed_schema, verify_user_state_schema,
};
use super::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DICTIONARY_LABEL: &str = "dictionary";
const PREFERENCES_LABEL: &str = "preferences";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the bundled dictionary lives and where its writable copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    /// Read-only seed file shipped with the app.
    pub seed_path: PathBuf,
    /// Writable copy opened by core.
    pub writable_path: PathBuf,
    /// Replace the writable copy on every open (development builds).
    pub force_copy: bool,
}

/// Installs (if needed) and opens the writable dictionary.
///
/// # Errors
/// - `SeedNotFound` when the bundled seed is missing.
/// - `SeedCopyFailed` when the writable copy cannot be created.
/// - `SchemaMismatch`/`UnsupportedSchemaVersion` when a fresh copy is still
///   not usable.
///
/// # Side effects
/// - May delete and recreate the writable copy (plus `-wal`/`-shm`).
/// - Emits `db_open` logging events with duration and status.
pub fn open_dictionary(config: &SeedConfig) -> DbResult<DbHandle> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file target={DICTIONARY_LABEL}");

    let result = install_seed_if_needed(config).and_then(|()| {
        match open_dictionary_file(&config.writable_path) {
            Err(err) if err.is_schema_error() => {
                warn!(
                    "event=db_schema_recovery module=db status=start error_code={} error={}",
                    err.code(),
                    err
                );
                reinstall_seed(config)?;
                open_dictionary_file(&config.writable_path)
            }
            other => other,
        }
    });

    match result {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=file target={DICTIONARY_LABEL} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(DbHandle::new(DICTIONARY_LABEL, conn))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file target={DICTIONARY_LABEL} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
            Err(err)
        }
    }
}

/// Opens an empty in-memory dictionary with seed tables and migrations applied.
pub fn open_dictionary_in_memory() -> DbResult<DbHandle> {
    let mut conn = Connection::open_in_memory()?;
    create_seed_schema(&conn)?;
    bootstrap_dictionary(&mut conn)?;
    info!("event=db_open module=db status=ok mode=memory target={DICTIONARY_LABEL}");
    Ok(DbHandle::new(DICTIONARY_LABEL, conn))
}

/// Opens (creating if needed) the preferences database file.
pub fn open_preferences(path: impl AsRef<Path>) -> DbResult<DbHandle> {
    let path = path.as_ref();
    let started_at = Instant::now();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| DbError::SeedCopyFailed {
                target: path.to_path_buf(),
                message: format!("cannot create parent directory: {err}"),
            })?;
        }
    }

    let result = Connection::open(path)
        .map_err(DbError::from)
        .and_then(|mut conn| bootstrap_preferences(&mut conn).map(|()| conn));
    match result {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode=file target={PREFERENCES_LABEL} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(DbHandle::new(PREFERENCES_LABEL, conn))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file target={PREFERENCES_LABEL} duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
            Err(err)
        }
    }
}

/// Opens an in-memory preferences database.
pub fn open_preferences_in_memory() -> DbResult<DbHandle> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap_preferences(&mut conn)?;
    Ok(DbHandle::new(PREFERENCES_LABEL, conn))
}

fn open_dictionary_file(path: &Path) -> DbResult<Connection> {
    let mut conn = Connection::open(path)?;
    bootstrap_dictionary(&mut conn)?;
    Ok(conn)
}

fn bootstrap_dictionary(conn: &mut Connection) -> DbResult<()> {
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    verify_seed_schema(conn)?;
    if table_exists(conn, "user_word_state")? {
        verify_user_state_schema(conn)?;
    }
    apply_migrations(conn, DICTIONARY_MIGRATIONS)?;
    verify_user_state_schema(conn)?;
    info!("event=db_bootstrap module=db status=ok target={DICTIONARY_LABEL} journal_mode={journal_mode}");
    Ok(())
}

fn bootstrap_preferences(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn, PREFERENCES_MIGRATIONS)?;
    Ok(())
}

fn install_seed_if_needed(config: &SeedConfig) -> DbResult<()> {
    if !config.seed_path.is_file() {
        return Err(DbError::SeedNotFound(config.seed_path.clone()));
    }
    if config.force_copy {
        return reinstall_seed(config);
    }
    if config.writable_path.exists() {
        return Ok(());
    }
    copy_seed(config)
}

fn reinstall_seed(config: &SeedConfig) -> DbResult<()> {
    remove_database_files(&config.writable_path)?;
    copy_seed(config)
}

fn copy_seed(config: &SeedConfig) -> DbResult<()> {
    let target = &config.writable_path;
    let copy_failed = |message: String| DbError::SeedCopyFailed {
        target: target.clone(),
        message,
    };

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|err| copy_failed(format!("cannot create parent directory: {err}")))?;
        }
    }
    let bytes = fs::copy(&config.seed_path, target)
        .map_err(|err| copy_failed(format!("copy failed: {err}")))?;
    info!(
        "event=seed_install module=db status=ok bytes={} target={}",
        bytes,
        target.display()
    );
    Ok(())
}

fn remove_database_files(path: &Path) -> DbResult<()> {
    let base = path.as_os_str().to_owned();
    for suffix in ["", "-wal", "-shm"] {
        let mut candidate = base.clone();
        candidate.push(suffix);
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            fs::remove_file(&candidate).map_err(|err| DbError::SeedCopyFailed {
                target: path.to_path_buf(),
                message: format!("cannot remove `{}`: {err}", candidate.display()),
            })?;
        }
    }
    Ok(())
}
