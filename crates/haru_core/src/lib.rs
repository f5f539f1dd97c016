//! Core domain logic for Haru, a JLPT vocabulary app.
//! Dictionary storage, daily deck selection and local preferences live here;
//! front ends only call into this crate.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LoggingError};
pub use model::deck::{DeckSnapshot, DECK_SIZE};
pub use model::lyric::LyricEntry;
pub use model::profile::{AppSettings, UserProfile};
pub use model::user_state::{ExclusionWindow, UserWordState};
pub use model::word::{JlptLevel, JlptLevelRange, Meaning, WordDetail, WordId, WordSummary};
pub use prefs::{KeyValueStore, PrefError, PrefResult, Preferences};
pub use repo::{DictionaryRepository, LyricRepository, Page, RepoError, RepoResult};
pub use service::{DeckService, HaruCore, TodayDeck, WordDetailView, WordService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
