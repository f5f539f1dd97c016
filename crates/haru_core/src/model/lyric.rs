//! Lyric-of-the-day record.

use serde::{Deserialize, Serialize};

/// One lyric line with the vocabulary word it showcases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricEntry {
    pub id: String,
    pub inspired_by: String,
    pub ja_line: String,
    pub ko_line: String,
    /// Surface form looked up in `word.expression` for the deck slot.
    pub target_expression: String,
    pub target_reading: String,
    pub target_meaning_ko: String,
    pub target_jlpt: String,
    pub tags: String,
}

impl LyricEntry {
    /// Byte range of the target expression inside `ja_line`, for highlighting.
    pub fn target_span(&self) -> Option<std::ops::Range<usize>> {
        if self.target_expression.is_empty() {
            return None;
        }
        self.ja_line
            .find(self.target_expression.as_str())
            .map(|start| start..start + self.target_expression.len())
    }
}
