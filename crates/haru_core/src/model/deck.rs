//! Daily deck snapshot.

use crate::model::word::WordId;
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Target number of cards in one daily deck.
pub const DECK_SIZE: usize = 10;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Date-stamped list of word ids selected for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    /// Local calendar day in `YYYY-MM-DD` form.
    pub date: String,
    /// Deck order; the lyric word, when present, is first.
    pub word_ids: Vec<WordId>,
    pub lyric_word_id: Option<WordId>,
}

impl DeckSnapshot {
    /// Returns whether this snapshot was built for `day_key`.
    pub fn is_for(&self, day_key: &str) -> bool {
        self.date == day_key
    }
}

/// Formats the local calendar day of `now` as a snapshot key.
pub fn day_key<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format_day(now.date_naive())
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{day_key, DeckSnapshot};
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn day_key_is_local_calendar_day() {
        let tz = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        let now = tz
            .with_ymd_and_hms(2024, 1, 2, 0, 30, 0)
            .single()
            .expect("valid time");
        assert_eq!(day_key(&now), "2024-01-02");

        let snapshot = DeckSnapshot {
            date: day_key(&now),
            word_ids: vec![1, 2],
            lyric_word_id: None,
        };
        assert!(snapshot.is_for("2024-01-02"));
        assert!(!snapshot.is_for("2024-01-03"));
    }
}
