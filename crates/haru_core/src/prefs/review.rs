//! Words the user marked for later review.
//!
//! The set is stored as one JSON array of ids under `review_words`, sorted
//! ascending. It is independent of the checked/learned flag.

use crate::model::word::WordId;
use crate::prefs::Preferences;
use std::collections::BTreeSet;

pub const REVIEW_WORDS_KEY: &str = "review_words";

#[derive(Debug, Clone)]
pub struct ReviewWordStore {
    prefs: Preferences,
}

impl ReviewWordStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn load(&self) -> BTreeSet<WordId> {
        self.prefs
            .read_json::<Vec<WordId>>(REVIEW_WORDS_KEY)
            .map(|ids| ids.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn save(&self, ids: &BTreeSet<WordId>) {
        let ids: Vec<WordId> = ids.iter().copied().collect();
        self.prefs.write_json(REVIEW_WORDS_KEY, &ids);
    }

    pub fn contains(&self, word_id: WordId) -> bool {
        self.load().contains(&word_id)
    }

    /// Flips membership of `word_id`; returns whether it is now marked.
    pub fn toggle(&self, word_id: WordId) -> bool {
        self.prefs.exclusive(|| {
            let mut ids = self.load();
            let marked = if ids.remove(&word_id) {
                false
            } else {
                ids.insert(word_id)
            };
            self.save(&ids);
            marked
        })
    }

    pub fn clear(&self) {
        self.prefs.exclusive(|| self.prefs.remove(REVIEW_WORDS_KEY));
    }
}
