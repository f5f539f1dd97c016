//! Key-value preference persistence.
//!
//! # Responsibility
//! - Define the byte-oriented `KeyValueStore` contract and its backends.
//! - Provide `Preferences`, the typed read-with-default / fire-and-forget
//!   write layer used by every local store.
//!
//! # Invariants
//! - Reads never fail from the caller's point of view: absence, corruption
//!   and backend errors all yield the caller's default.
//! - Writes are not transactional across keys; failures are logged only.
//! - Read-modify-write sections over one store run one at a time.
//! - Each typed store owns a disjoint set of keys.

use crate::db::DbError;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Mutex};

pub mod deck_store;
pub mod memory_store;
pub mod onboarding;
pub mod profile;
pub mod review;
pub mod settings;
pub mod sqlite_store;

pub use deck_store::HomeDeckStore;
pub use memory_store::MemoryKeyValueStore;
pub use onboarding::OnboardingStore;
pub use profile::UserProfileStore;
pub use review::ReviewWordStore;
pub use settings::AppSettingsStore;
pub use sqlite_store::SqliteKeyValueStore;

pub type PrefResult<T> = Result<T, PrefError>;

/// Backend or encoding failure inside the preference layer.
#[derive(Debug)]
pub enum PrefError {
    Db(DbError),
    /// Stored bytes could not be decoded into the requested shape.
    Decode { key: String, message: String },
    Encode { key: String, message: String },
}

impl Display for PrefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Decode { key, message } => write!(f, "cannot decode `{key}`: {message}"),
            Self::Encode { key, message } => write!(f, "cannot encode `{key}`: {message}"),
        }
    }
}

impl Error for PrefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Decode { .. } | Self::Encode { .. } => None,
        }
    }
}

impl From<DbError> for PrefError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PrefError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable byte-valued key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PrefResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> PrefResult<()>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> PrefResult<()>;
}

/// Typed facade over a shared [`KeyValueStore`].
///
/// Clones share the backend and the update lock.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    update_lock: Arc<Mutex<()>>,
}

impl Debug for Preferences {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs `update` while holding the store-wide update lock.
    ///
    /// Sections must not nest; plain reads and writes do not take the lock.
    pub fn exclusive<T>(&self, update: impl FnOnce() -> T) -> T {
        let _guard = self
            .update_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update()
    }

    /// Volatile preferences, used as fallback when the file cannot be opened.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::default()))
    }

    pub fn read_bytes(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!("event=pref_read module=prefs status=error key={key} error={err}");
                None
            }
        }
    }

    pub fn write_bytes(&self, key: &str, value: &[u8]) {
        if let Err(err) = self.store.set(key, value) {
            warn!("event=pref_write module=prefs status=error key={key} error={err}");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            warn!("event=pref_remove module=prefs status=error key={key} error={err}");
        }
    }

    pub fn read_string(&self, key: &str) -> Option<String> {
        let bytes = self.read_bytes(key)?;
        match String::from_utf8(bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                log_decode_failure(key, &err);
                None
            }
        }
    }

    pub fn write_string(&self, key: &str, value: &str) {
        self.write_bytes(key, value.as_bytes());
    }

    pub fn read_i64(&self, key: &str) -> Option<i64> {
        let raw = self.read_string(key)?;
        match raw.trim().parse::<i64>() {
            Ok(value) => Some(value),
            Err(err) => {
                log_decode_failure(key, &err);
                None
            }
        }
    }

    pub fn write_i64(&self, key: &str, value: i64) {
        self.write_string(key, &value.to_string());
    }

    pub fn read_bool(&self, key: &str) -> Option<bool> {
        match self.read_string(key)?.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => {
                log_decode_failure(key, &format!("unexpected boolean `{other}`"));
                None
            }
        }
    }

    pub fn write_bool(&self, key: &str, value: bool) {
        self.write_string(key, if value { "1" } else { "0" });
    }

    /// Decodes a JSON value; corrupt payloads read as absent.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.read_bytes(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                log_decode_failure(key, &err);
                None
            }
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.write_bytes(key, &bytes),
            Err(err) => {
                let err = PrefError::Encode {
                    key: key.to_string(),
                    message: err.to_string(),
                };
                warn!("event=pref_write module=prefs status=error key={key} error={err}");
            }
        }
    }
}

fn log_decode_failure(key: &str, detail: &dyn Display) {
    let err = PrefError::Decode {
        key: key.to_string(),
        message: detail.to_string(),
    };
    warn!("event=pref_read module=prefs status=error key={key} error={err}");
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKeyValueStore, Preferences};
    use std::sync::Arc;

    #[test]
    fn typed_reads_fall_back_on_corrupt_values() {
        let store = Arc::new(MemoryKeyValueStore::default());
        store.set("count", b"not a number").unwrap();
        store.set("flag", b"maybe").unwrap();
        store.set("ids", b"[1,2").unwrap();
        store.set("bin", &[0xff, 0xfe]).unwrap();

        let prefs = Preferences::new(store);
        assert_eq!(prefs.read_i64("count"), None);
        assert_eq!(prefs.read_bool("flag"), None);
        assert_eq!(prefs.read_json::<Vec<i64>>("ids"), None);
        assert_eq!(prefs.read_string("bin"), None);
        assert_eq!(prefs.read_bytes("bin"), Some(vec![0xff, 0xfe]));
    }

    #[test]
    fn typed_writes_roundtrip() {
        let prefs = Preferences::in_memory();
        prefs.write_i64("days", 14);
        prefs.write_bool("done", true);
        prefs.write_json("ids", &[3_i64, 1, 2]);

        assert_eq!(prefs.read_i64("days"), Some(14));
        assert_eq!(prefs.read_bool("done"), Some(true));
        assert_eq!(prefs.read_json::<Vec<i64>>("ids"), Some(vec![3, 1, 2]));

        prefs.remove("days");
        prefs.remove("days");
        assert_eq!(prefs.read_i64("days"), None);
    }
}
