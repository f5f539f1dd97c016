//! Serialized access to one SQLite connection.
//!
//! # Invariants
//! - At most one closure runs against the connection at any time.
//! - A panic inside a closure does not make the handle unusable.

use rusqlite::Connection;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;

/// Owns a connection and queues callers one at a time.
pub struct DbHandle {
    label: &'static str,
    conn: Mutex<Connection>,
}

impl DbHandle {
    pub fn new(label: &'static str, conn: Connection) -> Self {
        Self {
            label,
            conn: Mutex::new(conn),
        }
    }

    /// Short name used in log events (`dictionary`, `preferences`).
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Runs `work` with exclusive access to the connection.
    ///
    /// Blocks while another caller holds the connection. Not cancellable.
    pub fn with_conn<T>(&self, work: impl FnOnce(&mut Connection) -> T) -> T {
        let mut guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        work(&mut guard)
    }
}

impl Debug for DbHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
