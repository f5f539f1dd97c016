//! Word list and detail use cases.

use crate::model::word::{JlptLevel, WordDetail, WordId, WordSummary};
use crate::repo::{DictionaryRepository, Page, RepoResult};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Words sharing one kanji with the word being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedWords {
    pub kanji: String,
    pub words: Vec<WordSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDetailView {
    pub detail: WordDetail,
    pub is_checked: bool,
    /// One group per distinct kanji, in expression order; empty groups are dropped.
    pub related: Vec<RelatedWords>,
}

/// Result of a word list query before level filtering is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListing {
    pub words: Vec<WordSummary>,
    /// Levels present in the unfiltered result, easiest first.
    pub available_levels: Vec<JlptLevel>,
}

pub struct WordService {
    dictionary: Arc<dyn DictionaryRepository>,
}

impl WordService {
    pub fn new(dictionary: Arc<dyn DictionaryRepository>) -> Self {
        Self { dictionary }
    }

    /// Lists or searches all words, then keeps those in `levels`.
    ///
    /// `levels = None` keeps every level; an empty set keeps nothing.
    pub fn list_words(
        &self,
        query: &str,
        levels: Option<&BTreeSet<JlptLevel>>,
    ) -> RepoResult<WordListing> {
        let words = self.dictionary.search_words(None, query, Page::default())?;
        let available_levels = words
            .iter()
            .map(|word| word.level)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let words = match levels {
            Some(levels) => words
                .into_iter()
                .filter(|word| levels.contains(&word.level))
                .collect(),
            None => words,
        };
        Ok(WordListing {
            words,
            available_levels,
        })
    }

    /// Detail plus per-kanji recommendations, or `None` for an unknown id.
    pub fn word_detail(
        &self,
        word_id: WordId,
        related_per_kanji: u32,
    ) -> RepoResult<Option<WordDetailView>> {
        let Some(detail) = self.dictionary.fetch_word_detail(word_id)? else {
            return Ok(None);
        };

        let mut related = Vec::new();
        if related_per_kanji > 0 {
            for kanji in detail.kanji() {
                let words = self.dictionary.recommend_by_kanji(
                    &kanji,
                    detail.level,
                    detail.id,
                    related_per_kanji,
                )?;
                if !words.is_empty() {
                    related.push(RelatedWords { kanji, words });
                }
            }
        }

        let is_checked = self
            .dictionary
            .checked_word_ids(&[word_id])?
            .contains(&word_id);
        Ok(Some(WordDetailView {
            detail,
            is_checked,
            related,
        }))
    }
}
