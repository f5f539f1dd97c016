//! Daily deck selection.
//!
//! # Responsibility
//! - Build the deck for the caller's local calendar day, at most once per day.
//! - Apply the checked-word exclusion window and explicit exclusion marks.
//! - Reserve the first slot for the lyric-of-the-day word when eligible.
//!
//! # Invariants
//! - A stored snapshot whose date equals today is returned unchanged.
//! - No id excluded at build time is ever placed in the deck.
//! - A deck shorter than `DECK_SIZE` is a valid result, not an error.
//! - Settings changes apply to the next day's deck.
//! - At most one deck is built per day, even with concurrent callers.

use crate::model::deck::{day_key, DeckSnapshot, DECK_SIZE};
use crate::model::lyric::LyricEntry;
use crate::model::user_state::ExclusionWindow;
use crate::model::word::{WordId, WordSummary};
use crate::prefs::{AppSettingsStore, HomeDeckStore};
use crate::repo::{DictionaryRepository, LyricRepository, RepoResult};
use chrono::{DateTime, Datelike, TimeZone};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Today's deck resolved into displayable cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayDeck {
    pub snapshot: DeckSnapshot,
    /// Cards in deck order; ids that no longer resolve are skipped.
    pub cards: Vec<WordSummary>,
    pub checked: BTreeSet<WordId>,
    pub lyric: Option<LyricEntry>,
}

impl TodayDeck {
    pub fn is_checked(&self, word_id: WordId) -> bool {
        self.checked.contains(&word_id)
    }
}

pub struct DeckService {
    dictionary: Arc<dyn DictionaryRepository>,
    lyrics: Arc<dyn LyricRepository>,
    settings: AppSettingsStore,
    decks: HomeDeckStore,
}

impl DeckService {
    pub fn new(
        dictionary: Arc<dyn DictionaryRepository>,
        lyrics: Arc<dyn LyricRepository>,
        settings: AppSettingsStore,
        decks: HomeDeckStore,
    ) -> Self {
        Self {
            dictionary,
            lyrics,
            settings,
            decks,
        }
    }

    /// Returns today's snapshot, building and persisting it on a new day.
    ///
    /// Concurrent callers on a new day wait for the first build and all
    /// receive the persisted snapshot.
    pub fn todays_deck<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RepoResult<DeckSnapshot> {
        let today = day_key(now);
        self.decks.exclusive(|| -> RepoResult<DeckSnapshot> {
            if let Some(snapshot) = self.decks.load() {
                if snapshot.is_for(&today) {
                    debug!(
                        "event=deck_load module=deck status=cached date={} size={}",
                        today,
                        snapshot.word_ids.len()
                    );
                    return Ok(snapshot);
                }
            }

            let snapshot = self.build_deck(now, today.clone())?;
            self.decks.save(&snapshot);
            info!(
                "event=deck_build module=deck status=ok date={} size={} lyric_slot={}",
                snapshot.date,
                snapshot.word_ids.len(),
                snapshot.lyric_word_id.is_some()
            );
            Ok(snapshot)
        })
    }

    /// Today's deck with word summaries, checked flags and the lyric.
    pub fn todays_cards<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RepoResult<TodayDeck> {
        let snapshot = self.todays_deck(now)?;
        let mut cards = Vec::with_capacity(snapshot.word_ids.len());
        for word_id in &snapshot.word_ids {
            match self.dictionary.fetch_word_summary(*word_id)? {
                Some(card) => cards.push(card),
                None => warn!("event=deck_card module=deck status=missing word_id={word_id}"),
            }
        }
        let checked = self.dictionary.checked_word_ids(&snapshot.word_ids)?;
        Ok(TodayDeck {
            lyric: self.todays_lyric(now),
            snapshot,
            cards,
            checked,
        })
    }

    /// Lyric entry for the local day of `now`; lookup failures read as none.
    pub fn todays_lyric<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<LyricEntry> {
        match self.lyrics.lyric_for_day(now.ordinal()) {
            Ok(lyric) => lyric,
            Err(err) => {
                warn!("event=lyric_load module=deck status=error error={err}");
                None
            }
        }
    }

    /// Ids withheld from a deck built at `now`.
    ///
    /// Union of active excluded-until marks and words checked inside the
    /// configured window.
    pub fn excluded_word_ids<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RepoResult<BTreeSet<WordId>> {
        self.excluded_with_window(self.settings.exclusion_window(), now)
    }

    /// Flips the checked flag of `word_id`; returns the new state.
    ///
    /// Today's snapshot is left as is; the change affects later decks.
    pub fn toggle_checked<Tz: TimeZone>(&self, word_id: WordId, now: &DateTime<Tz>) -> RepoResult<bool> {
        let checked = self
            .dictionary
            .toggle_checked(word_id, now.timestamp_millis())?;
        info!("event=word_check module=deck status=ok word_id={word_id} checked={checked}");
        Ok(checked)
    }

    pub fn is_checked(&self, word_id: WordId) -> RepoResult<bool> {
        Ok(self
            .dictionary
            .checked_word_ids(&[word_id])?
            .contains(&word_id))
    }

    /// Clears every user word state and the stored snapshot.
    ///
    /// Returns the number of state rows removed.
    pub fn reset_learning_data(&self) -> RepoResult<usize> {
        let removed = self.decks.exclusive(|| -> RepoResult<usize> {
            let removed = self.dictionary.reset_user_word_state()?;
            self.decks.reset();
            Ok(removed)
        })?;
        info!("event=learning_reset module=deck status=ok removed={removed}");
        Ok(removed)
    }

    fn build_deck<Tz: TimeZone>(&self, now: &DateTime<Tz>, today: String) -> RepoResult<DeckSnapshot> {
        let settings = self.settings.load();
        let mut excluded = self.excluded_with_window(settings.exclusion_window, now)?;

        let mut word_ids = Vec::with_capacity(DECK_SIZE);
        let mut lyric_word_id = None;
        if let Some(word) = self.todays_lyric_word(now)? {
            let checked = self.is_checked(word.id)?;
            if !checked && !excluded.contains(&word.id) {
                word_ids.push(word.id);
                lyric_word_id = Some(word.id);
            }
            excluded.insert(word.id);
        }

        let remaining = DECK_SIZE - word_ids.len();
        let sampled =
            self.dictionary
                .random_word_ids(settings.home_deck_level, remaining, &excluded)?;
        if sampled.len() < remaining {
            debug!(
                "event=deck_build module=deck status=short level={} wanted={} got={}",
                settings.home_deck_level,
                remaining,
                sampled.len()
            );
        }
        word_ids.extend(sampled);

        Ok(DeckSnapshot {
            date: today,
            word_ids,
            lyric_word_id,
        })
    }

    fn todays_lyric_word<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RepoResult<Option<WordSummary>> {
        let Some(lyric) = self.todays_lyric(now) else {
            return Ok(None);
        };
        let expression = lyric.target_expression.trim();
        if expression.is_empty() {
            return Ok(None);
        }
        self.dictionary.find_by_expression(expression)
    }

    fn excluded_with_window<Tz: TimeZone>(
        &self,
        window: ExclusionWindow,
        now: &DateTime<Tz>,
    ) -> RepoResult<BTreeSet<WordId>> {
        let mut excluded = self.dictionary.excluded_until_ids(now.timestamp_millis())?;
        excluded.extend(
            self.dictionary
                .user_word_states()?
                .into_iter()
                .filter(|state| state.is_excluded_at(window, now))
                .map(|state| state.word_id),
        );
        Ok(excluded)
    }
}
