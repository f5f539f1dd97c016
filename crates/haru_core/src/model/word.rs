//! Vocabulary domain model.
//!
//! # Responsibility
//! - Define word summary/detail records read from the dictionary store.
//! - Own JLPT level parsing, ranking and contiguous level ranges.
//!
//! # Invariants
//! - `JlptLevel::rank` is 1 for N1 (hardest) through 5 for N5 (easiest).
//! - Meanings are ordered by their `ord` column, never by insertion.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

static KANJI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").expect("valid kanji regex"));

/// Separator used when meanings are flattened into one display string.
pub const MEANING_SEPARATOR: &str = " / ";

/// Stable integer identifier of a dictionary word.
pub type WordId = i64;

/// JLPT proficiency level, N5 (easiest) to N1 (hardest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    /// All levels from easiest to hardest.
    pub const ALL: [JlptLevel; 5] = [
        JlptLevel::N5,
        JlptLevel::N4,
        JlptLevel::N3,
        JlptLevel::N2,
        JlptLevel::N1,
    ];

    /// Storage label used in `word.level`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::N5 => "N5",
            Self::N4 => "N4",
            Self::N3 => "N3",
            Self::N2 => "N2",
            Self::N1 => "N1",
        }
    }

    /// Parses a storage label (case-insensitive, surrounding whitespace ignored).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "N5" => Some(Self::N5),
            "N4" => Some(Self::N4),
            "N3" => Some(Self::N3),
            "N2" => Some(Self::N2),
            "N1" => Some(Self::N1),
            _ => None,
        }
    }

    /// Ordinal rank: N1 = 1 .. N5 = 5.
    pub fn rank(self) -> i64 {
        match self {
            Self::N1 => 1,
            Self::N2 => 2,
            Self::N3 => 3,
            Self::N4 => 4,
            Self::N5 => 5,
        }
    }

    /// Absolute rank distance between two levels.
    pub fn distance(self, other: JlptLevel) -> i64 {
        (self.rank() - other.rank()).abs()
    }
}

impl Default for JlptLevel {
    fn default() -> Self {
        Self::N5
    }
}

impl Display for JlptLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contiguous span of levels offered by the word list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JlptLevelRange {
    All,
    N5ToN4,
    N5ToN3,
    N5ToN2,
    N5ToN1,
    N4ToN3,
    N4ToN2,
    N4ToN1,
    N3ToN2,
    N3ToN1,
    N2ToN1,
}

impl JlptLevelRange {
    pub const ALL_RANGES: [JlptLevelRange; 11] = [
        JlptLevelRange::All,
        JlptLevelRange::N5ToN4,
        JlptLevelRange::N5ToN3,
        JlptLevelRange::N5ToN2,
        JlptLevelRange::N5ToN1,
        JlptLevelRange::N4ToN3,
        JlptLevelRange::N4ToN2,
        JlptLevelRange::N4ToN1,
        JlptLevelRange::N3ToN2,
        JlptLevelRange::N3ToN1,
        JlptLevelRange::N2ToN1,
    ];

    /// Levels covered by this range, easiest first.
    pub fn levels(self) -> Vec<JlptLevel> {
        let (from, to) = match self {
            Self::All => return JlptLevel::ALL.to_vec(),
            Self::N5ToN4 => (JlptLevel::N5, JlptLevel::N4),
            Self::N5ToN3 => (JlptLevel::N5, JlptLevel::N3),
            Self::N5ToN2 => (JlptLevel::N5, JlptLevel::N2),
            Self::N5ToN1 => (JlptLevel::N5, JlptLevel::N1),
            Self::N4ToN3 => (JlptLevel::N4, JlptLevel::N3),
            Self::N4ToN2 => (JlptLevel::N4, JlptLevel::N2),
            Self::N4ToN1 => (JlptLevel::N4, JlptLevel::N1),
            Self::N3ToN2 => (JlptLevel::N3, JlptLevel::N2),
            Self::N3ToN1 => (JlptLevel::N3, JlptLevel::N1),
            Self::N2ToN1 => (JlptLevel::N2, JlptLevel::N1),
        };
        JlptLevel::ALL
            .into_iter()
            .filter(|level| level.rank() <= from.rank() && level.rank() >= to.rank())
            .collect()
    }

    pub fn contains(self, level: JlptLevel) -> bool {
        self.levels().contains(&level)
    }

    /// Display label, e.g. `N5~N3`.
    pub fn label(self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            other => {
                let levels = other.levels();
                match (levels.first(), levels.last()) {
                    (Some(first), Some(last)) => format!("{first}~{last}"),
                    _ => String::new(),
                }
            }
        }
    }

    /// Ranges whose levels are all present in `available`.
    ///
    /// `All` is always offered; an empty input yields only `All`.
    pub fn available_ranges(available: &BTreeSet<JlptLevel>) -> Vec<JlptLevelRange> {
        if available.is_empty() {
            return vec![Self::All];
        }
        Self::ALL_RANGES
            .into_iter()
            .filter(|range| {
                *range == Self::All
                    || range
                        .levels()
                        .iter()
                        .all(|level| available.contains(level))
            })
            .collect()
    }
}

/// One ordered meaning of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meaning {
    pub ord: i64,
    pub text: String,
}

/// List-row projection of a word with meanings flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSummary {
    pub id: WordId,
    pub level: JlptLevel,
    pub expression: String,
    pub reading: String,
    /// Meanings joined with [`MEANING_SEPARATOR`] in `ord` order.
    pub meanings: String,
}

/// Detail projection of a word with ordered meanings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDetail {
    pub id: WordId,
    pub level: JlptLevel,
    pub expression: String,
    pub reading: String,
    pub meanings: Vec<Meaning>,
}

impl WordDetail {
    /// Meanings joined for display; `—` when the word has none.
    pub fn meanings_joined(&self) -> String {
        let joined = self
            .meanings
            .iter()
            .map(|meaning| meaning.text.as_str())
            .collect::<Vec<_>>()
            .join(MEANING_SEPARATOR);
        if joined.is_empty() {
            "—".to_string()
        } else {
            joined
        }
    }

    /// Distinct kanji in the expression, in first-seen order.
    pub fn kanji(&self) -> Vec<String> {
        kanji_characters(&self.expression)
    }
}

/// Extracts distinct Han characters from `text`, preserving first occurrence order.
pub fn kanji_characters(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    KANJI_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|kanji| seen.insert(kanji.clone()))
        .collect()
}
