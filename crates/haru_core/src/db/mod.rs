//! SQLite storage bootstrap, seed installation and schema migrations.
//!
//! # Responsibility
//! - Install the bundled seed dictionary into writable storage.
//! - Open and configure SQLite connections for Haru core.
//! - Apply user-state and preference schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Every connection is reached through a [`DbHandle`], one call at a time.
//! - Core code must not read/write application data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod handle;
pub mod migrations;
mod open;
pub mod seed;

pub use handle::DbHandle;
pub use open::{
    open_dictionary, open_dictionary_in_memory, open_preferences, open_preferences_in_memory,
    SeedConfig,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Bundled seed file does not exist.
    SeedNotFound(PathBuf),
    /// Seed could not be copied into writable storage.
    SeedCopyFailed { target: PathBuf, message: String },
    /// Required table or column is missing from an opened database.
    SchemaMismatch(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Errors that a fresh seed copy can repair.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaMismatch(_) | Self::UnsupportedSchemaVersion { .. }
        )
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::SeedNotFound(_) => "seed_not_found",
            Self::SeedCopyFailed { .. } => "seed_copy_failed",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::UnsupportedSchemaVersion { .. } => "unsupported_schema_version",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SeedNotFound(path) => {
                write!(f, "bundled dictionary not found at `{}`", path.display())
            }
            Self::SeedCopyFailed { target, message } => write!(
                f,
                "failed to install dictionary at `{}`: {message}",
                target.display()
            ),
            Self::SchemaMismatch(details) => write!(f, "dictionary schema mismatch: {details}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
