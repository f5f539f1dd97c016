//! Volatile in-process key-value store.

use crate::prefs::{KeyValueStore, PrefResult};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Map-backed store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    fn with_entries<T>(&self, work: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> T) -> T {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        work(&mut guard)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> PrefResult<Option<Vec<u8>>> {
        Ok(self.with_entries(|entries| entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &[u8]) -> PrefResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_vec());
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> PrefResult<()> {
        self.with_entries(|entries| {
            entries.remove(key);
        });
        Ok(())
    }
}
