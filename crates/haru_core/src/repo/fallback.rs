//! Non-functional repositories used when the dictionary cannot be opened.
//!
//! `StubDictionaryRepository` answers every call with "no match" so previews
//! and tests can render empty states. `UnavailableDictionaryRepository`
//! fails every call with the startup reason so the front end can show it.

use crate::model::user_state::UserWordState;
use crate::model::word::{JlptLevel, WordDetail, WordId, WordSummary};
use crate::repo::dictionary_repo::{DictionaryRepository, Page, RepoError, RepoResult};
use std::collections::BTreeSet;

/// Empty repository: reads return nothing, writes are no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDictionaryRepository;

impl DictionaryRepository for StubDictionaryRepository {
    fn fetch_words(&self, _level: Option<JlptLevel>, _page: Page) -> RepoResult<Vec<WordSummary>> {
        Ok(Vec::new())
    }

    fn search_words(
        &self,
        _level: Option<JlptLevel>,
        _query: &str,
        _page: Page,
    ) -> RepoResult<Vec<WordSummary>> {
        Ok(Vec::new())
    }

    fn fetch_word_detail(&self, _word_id: WordId) -> RepoResult<Option<WordDetail>> {
        Ok(None)
    }

    fn fetch_word_summary(&self, _word_id: WordId) -> RepoResult<Option<WordSummary>> {
        Ok(None)
    }

    fn find_by_expression(&self, _expression: &str) -> RepoResult<Option<WordSummary>> {
        Ok(None)
    }

    fn random_word(&self, _level: JlptLevel) -> RepoResult<Option<WordSummary>> {
        Ok(None)
    }

    fn random_words(
        &self,
        _limit: u32,
        _excluding_expression: Option<&str>,
    ) -> RepoResult<Vec<WordSummary>> {
        Ok(Vec::new())
    }

    fn random_word_ids(
        &self,
        _level: JlptLevel,
        _count: usize,
        _excluding: &BTreeSet<WordId>,
    ) -> RepoResult<Vec<WordId>> {
        Ok(Vec::new())
    }

    fn recommend_by_kanji(
        &self,
        _kanji: &str,
        _current_level: JlptLevel,
        _excluding_word_id: WordId,
        _limit: u32,
    ) -> RepoResult<Vec<WordSummary>> {
        Ok(Vec::new())
    }

    fn available_levels(&self) -> RepoResult<Vec<JlptLevel>> {
        Ok(Vec::new())
    }

    fn checked_word_ids(&self, _word_ids: &[WordId]) -> RepoResult<BTreeSet<WordId>> {
        Ok(BTreeSet::new())
    }

    fn set_checked(&self, _word_id: WordId, _checked: bool, _now_ms: i64) -> RepoResult<()> {
        Ok(())
    }

    fn toggle_checked(&self, _word_id: WordId, _now_ms: i64) -> RepoResult<bool> {
        Ok(false)
    }

    fn user_word_states(&self) -> RepoResult<Vec<UserWordState>> {
        Ok(Vec::new())
    }

    fn set_excluded_until(
        &self,
        _word_id: WordId,
        _until_ms: Option<i64>,
        _now_ms: i64,
    ) -> RepoResult<()> {
        Ok(())
    }

    fn excluded_until_ids(&self, _now_ms: i64) -> RepoResult<BTreeSet<WordId>> {
        Ok(BTreeSet::new())
    }

    fn reset_user_word_state(&self) -> RepoResult<usize> {
        Ok(0)
    }
}

/// Repository that fails every call with `StoreUnavailable(reason)`.
#[derive(Debug, Clone)]
pub struct UnavailableDictionaryRepository {
    reason: String,
}

impl UnavailableDictionaryRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> RepoResult<T> {
        Err(RepoError::StoreUnavailable(self.reason.clone()))
    }
}

impl DictionaryRepository for UnavailableDictionaryRepository {
    fn fetch_words(&self, _level: Option<JlptLevel>, _page: Page) -> RepoResult<Vec<WordSummary>> {
        self.fail()
    }

    fn search_words(
        &self,
        _level: Option<JlptLevel>,
        _query: &str,
        _page: Page,
    ) -> RepoResult<Vec<WordSummary>> {
        self.fail()
    }

    fn fetch_word_detail(&self, _word_id: WordId) -> RepoResult<Option<WordDetail>> {
        self.fail()
    }

    fn fetch_word_summary(&self, _word_id: WordId) -> RepoResult<Option<WordSummary>> {
        self.fail()
    }

    fn find_by_expression(&self, _expression: &str) -> RepoResult<Option<WordSummary>> {
        self.fail()
    }

    fn random_word(&self, _level: JlptLevel) -> RepoResult<Option<WordSummary>> {
        self.fail()
    }

    fn random_words(
        &self,
        _limit: u32,
        _excluding_expression: Option<&str>,
    ) -> RepoResult<Vec<WordSummary>> {
        self.fail()
    }

    fn random_word_ids(
        &self,
        _level: JlptLevel,
        _count: usize,
        _excluding: &BTreeSet<WordId>,
    ) -> RepoResult<Vec<WordId>> {
        self.fail()
    }

    fn recommend_by_kanji(
        &self,
        _kanji: &str,
        _current_level: JlptLevel,
        _excluding_word_id: WordId,
        _limit: u32,
    ) -> RepoResult<Vec<WordSummary>> {
        self.fail()
    }

    fn available_levels(&self) -> RepoResult<Vec<JlptLevel>> {
        self.fail()
    }

    fn checked_word_ids(&self, _word_ids: &[WordId]) -> RepoResult<BTreeSet<WordId>> {
        self.fail()
    }

    fn set_checked(&self, _word_id: WordId, _checked: bool, _now_ms: i64) -> RepoResult<()> {
        self.fail()
    }

    fn toggle_checked(&self, _word_id: WordId, _now_ms: i64) -> RepoResult<bool> {
        self.fail()
    }

    fn user_word_states(&self) -> RepoResult<Vec<UserWordState>> {
        self.fail()
    }

    fn set_excluded_until(
        &self,
        _word_id: WordId,
        _until_ms: Option<i64>,
        _now_ms: i64,
    ) -> RepoResult<()> {
        self.fail()
    }

    fn excluded_until_ids(&self, _now_ms: i64) -> RepoResult<BTreeSet<WordId>> {
        self.fail()
    }

    fn reset_user_word_state(&self) -> RepoResult<usize> {
        self.fail()
    }
}
