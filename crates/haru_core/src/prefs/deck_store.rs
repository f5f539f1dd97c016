//! Persisted daily deck snapshot.
//!
//! # Invariants
//! - A snapshot is only returned when both the date and the id list decode.
//! - `reset` removes every deck key so the next read builds a fresh deck.
//! - Callers that build a snapshot hold `exclusive` across load and save.

use crate::model::deck::DeckSnapshot;
use crate::model::word::WordId;
use crate::prefs::Preferences;

pub const DECK_DATE_KEY: &str = "home_deck_date";
pub const DECK_WORD_IDS_KEY: &str = "home_deck_word_ids";
pub const DECK_LYRIC_WORD_ID_KEY: &str = "home_deck_lyric_word_id";

#[derive(Debug, Clone)]
pub struct HomeDeckStore {
    prefs: Preferences,
}

impl HomeDeckStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn load(&self) -> Option<DeckSnapshot> {
        let date = self.prefs.read_string(DECK_DATE_KEY)?;
        let word_ids = self.prefs.read_json::<Vec<WordId>>(DECK_WORD_IDS_KEY)?;
        Some(DeckSnapshot {
            date,
            word_ids,
            lyric_word_id: self.prefs.read_i64(DECK_LYRIC_WORD_ID_KEY),
        })
    }

    pub fn save(&self, snapshot: &DeckSnapshot) {
        self.prefs.write_json(DECK_WORD_IDS_KEY, &snapshot.word_ids);
        match snapshot.lyric_word_id {
            Some(id) => self.prefs.write_i64(DECK_LYRIC_WORD_ID_KEY, id),
            None => self.prefs.remove(DECK_LYRIC_WORD_ID_KEY),
        }
        // Date last: a partial write leaves no valid snapshot for the new day.
        self.prefs.write_string(DECK_DATE_KEY, &snapshot.date);
    }

    /// Runs `work` under the preference update lock, so a load-build-save
    /// sequence is not interleaved with another one.
    pub fn exclusive<T>(&self, work: impl FnOnce() -> T) -> T {
        self.prefs.exclusive(work)
    }

    pub fn reset(&self) {
        self.prefs.remove(DECK_DATE_KEY);
        self.prefs.remove(DECK_WORD_IDS_KEY);
        self.prefs.remove(DECK_LYRIC_WORD_ID_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::{HomeDeckStore, DECK_DATE_KEY, DECK_WORD_IDS_KEY};
    use crate::model::deck::DeckSnapshot;
    use crate::prefs::Preferences;

    #[test]
    fn snapshot_requires_date_and_ids() {
        let prefs = Preferences::in_memory();
        let store = HomeDeckStore::new(prefs.clone());
        assert_eq!(store.load(), None);

        prefs.write_string(DECK_DATE_KEY, "2024-05-20");
        assert_eq!(store.load(), None);

        prefs.write_string(DECK_WORD_IDS_KEY, "[3, 1]");
        let loaded = store.load().expect("snapshot");
        assert_eq!(loaded.word_ids, vec![3, 1]);
        assert_eq!(loaded.lyric_word_id, None);
    }

    #[test]
    fn save_then_reset() {
        let store = HomeDeckStore::new(Preferences::in_memory());
        let snapshot = DeckSnapshot {
            date: "2024-05-20".to_string(),
            word_ids: vec![9, 4, 2],
            lyric_word_id: Some(9),
        };
        store.save(&snapshot);
        assert_eq!(store.load(), Some(snapshot));

        store.reset();
        assert_eq!(store.load(), None);
    }
}
