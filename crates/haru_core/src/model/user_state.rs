//! Per-user word state and exclusion-window math.
//!
//! # Responsibility
//! - Describe the mutable `user_word_state` row attached to a word.
//! - Decide whether a checked word is still withheld from the deck.
//!
//! # Invariants
//! - Timestamps are Unix epoch milliseconds.
//! - Exclusion compares local calendar days, not elapsed hours.

use crate::model::word::WordId;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number of days a checked word is withheld from resurfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionWindow {
    OneWeek,
    TwoWeeks,
    OneMonth,
}

impl ExclusionWindow {
    pub const ALL: [ExclusionWindow; 3] = [Self::OneWeek, Self::TwoWeeks, Self::OneMonth];

    pub fn days(self) -> i64 {
        match self {
            Self::OneWeek => 7,
            Self::TwoWeeks => 14,
            Self::OneMonth => 30,
        }
    }

    /// Maps a persisted day count back to a window; unknown values yield `None`.
    pub fn from_days(days: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|window| window.days() == days)
    }

    /// Returns whether a word checked on `checked_on` is still excluded on `today`.
    ///
    /// Future check dates (clock moved backwards) count as excluded.
    pub fn excludes(self, checked_on: NaiveDate, today: NaiveDate) -> bool {
        if checked_on > today {
            return true;
        }
        (today - checked_on).num_days() < self.days()
    }
}

impl Default for ExclusionWindow {
    fn default() -> Self {
        Self::OneWeek
    }
}

/// Mutable per-word flags stored next to the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWordState {
    pub word_id: WordId,
    pub is_checked: bool,
    pub checked_at: Option<i64>,
    pub updated_at: i64,
    pub excluded_until: Option<i64>,
}

impl UserWordState {
    /// Returns whether this state withholds the word from a deck built at `now`.
    pub fn is_excluded_at<Tz: TimeZone>(&self, window: ExclusionWindow, now: &DateTime<Tz>) -> bool {
        if let Some(until) = self.excluded_until {
            if until > now.timestamp_millis() {
                return true;
            }
        }
        if !self.is_checked {
            return false;
        }
        match self.checked_at {
            Some(checked_at) => match local_day(checked_at, &now.timezone()) {
                Some(checked_on) => window.excludes(checked_on, now.date_naive()),
                None => false,
            },
            None => false,
        }
    }
}

/// Converts epoch milliseconds into a calendar day in `tz`.
pub fn local_day<Tz: TimeZone>(epoch_ms: i64, tz: &Tz) -> Option<NaiveDate> {
    Utc.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::{local_day, ExclusionWindow, UserWordState};
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn window_days_roundtrip_and_reject_unknown() {
        assert_eq!(ExclusionWindow::from_days(14), Some(ExclusionWindow::TwoWeeks));
        assert_eq!(ExclusionWindow::from_days(10), None);
        assert_eq!(ExclusionWindow::default().days(), 7);
    }

    #[test]
    fn seven_day_window_boundaries() {
        let window = ExclusionWindow::OneWeek;
        let today = day(2024, 5, 20);
        assert!(window.excludes(day(2024, 5, 17), today));
        assert!(window.excludes(day(2024, 5, 14), today));
        assert!(!window.excludes(day(2024, 5, 13), today));
        assert!(!window.excludes(day(2024, 5, 10), today));
        assert!(window.excludes(day(2024, 5, 21), today));
    }

    #[test]
    fn local_day_uses_caller_timezone() {
        let kst = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        // 2024-05-19T20:00:00Z is already 2024-05-20 in Seoul.
        let instant = chrono::Utc
            .with_ymd_and_hms(2024, 5, 19, 20, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(
            local_day(instant.timestamp_millis(), &kst),
            Some(day(2024, 5, 20))
        );
    }

    #[test]
    fn state_exclusion_combines_checked_and_until() {
        let tz = FixedOffset::east_opt(0).expect("valid offset");
        let now = tz
            .with_ymd_and_hms(2024, 5, 20, 12, 0, 0)
            .single()
            .expect("valid now");
        let mut state = UserWordState {
            word_id: 7,
            is_checked: true,
            checked_at: Some((now - Duration::days(3)).timestamp_millis()),
            updated_at: now.timestamp_millis(),
            excluded_until: None,
        };
        assert!(state.is_excluded_at(ExclusionWindow::OneWeek, &now));

        state.checked_at = Some((now - Duration::days(10)).timestamp_millis());
        assert!(!state.is_excluded_at(ExclusionWindow::OneWeek, &now));

        state.excluded_until = Some((now + Duration::hours(1)).timestamp_millis());
        assert!(state.is_excluded_at(ExclusionWindow::OneWeek, &now));
    }
}
