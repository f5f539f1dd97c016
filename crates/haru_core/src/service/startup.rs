//! Composition root: opens the stores once and hands out services.
//!
//! # Invariants
//! - Opening never fails. A dictionary that cannot be installed or opened
//!   is replaced by `UnavailableDictionaryRepository` carrying the reason.
//! - A preference file that cannot be opened is replaced by volatile
//!   in-memory preferences.

use crate::config::CoreConfig;
use crate::db::{open_dictionary, open_preferences, SeedConfig};
use crate::prefs::{
    AppSettingsStore, HomeDeckStore, OnboardingStore, Preferences, ReviewWordStore,
    SqliteKeyValueStore, UserProfileStore,
};
use crate::repo::{
    DictionaryRepository, LyricRepository, SqliteDictionaryRepository, SqliteLyricRepository,
    StubLyricRepository, UnavailableDictionaryRepository,
};
use crate::service::deck_service::DeckService;
use crate::service::word_service::WordService;
use log::{error, warn};
use std::path::Path;
use std::sync::Arc;

/// Dictionary and lyric repositories sharing one database handle.
pub struct OpenedRepositories {
    pub dictionary: Arc<dyn DictionaryRepository>,
    pub lyrics: Arc<dyn LyricRepository>,
    /// Why the real store is not in use, when it is not.
    pub startup_error: Option<String>,
}

/// Opens the dictionary, falling back to the unavailable repository.
///
/// Schema recovery (one seed recopy) happens inside `open_dictionary`.
pub fn open_repository(config: &SeedConfig) -> OpenedRepositories {
    match open_dictionary(config) {
        Ok(handle) => {
            let handle = Arc::new(handle);
            OpenedRepositories {
                dictionary: Arc::new(SqliteDictionaryRepository::new(Arc::clone(&handle))),
                lyrics: Arc::new(SqliteLyricRepository::new(handle)),
                startup_error: None,
            }
        }
        Err(err) => {
            error!(
                "event=repo_open module=startup status=error code={} error={err}",
                err.code()
            );
            let reason = err.to_string();
            OpenedRepositories {
                dictionary: Arc::new(UnavailableDictionaryRepository::new(reason.clone())),
                lyrics: Arc::new(StubLyricRepository),
                startup_error: Some(reason),
            }
        }
    }
}

/// Opens file-backed preferences, falling back to memory.
pub fn open_preference_store(path: impl AsRef<Path>) -> Preferences {
    match open_preferences(path.as_ref()) {
        Ok(handle) => Preferences::new(Arc::new(SqliteKeyValueStore::new(Arc::new(handle)))),
        Err(err) => {
            warn!(
                "event=prefs_open module=startup status=fallback path={} error={err}",
                path.as_ref().display()
            );
            Preferences::in_memory()
        }
    }
}

/// Long-lived handles for one app process.
pub struct HaruCore {
    dictionary: Arc<dyn DictionaryRepository>,
    lyrics: Arc<dyn LyricRepository>,
    prefs: Preferences,
    startup_error: Option<String>,
}

impl HaruCore {
    pub fn open(config: &CoreConfig) -> Self {
        let repos = open_repository(&config.seed_config());
        Self {
            dictionary: repos.dictionary,
            lyrics: repos.lyrics,
            prefs: open_preference_store(config.preferences_path()),
            startup_error: repos.startup_error,
        }
    }

    pub fn from_parts(
        dictionary: Arc<dyn DictionaryRepository>,
        lyrics: Arc<dyn LyricRepository>,
        prefs: Preferences,
    ) -> Self {
        Self {
            dictionary,
            lyrics,
            prefs,
            startup_error: None,
        }
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.startup_error.as_deref()
    }

    pub fn dictionary(&self) -> Arc<dyn DictionaryRepository> {
        Arc::clone(&self.dictionary)
    }

    pub fn deck_service(&self) -> DeckService {
        DeckService::new(
            self.dictionary(),
            Arc::clone(&self.lyrics),
            self.settings(),
            HomeDeckStore::new(self.prefs.clone()),
        )
    }

    pub fn word_service(&self) -> WordService {
        WordService::new(self.dictionary())
    }

    pub fn settings(&self) -> AppSettingsStore {
        AppSettingsStore::new(self.prefs.clone())
    }

    pub fn profile(&self) -> UserProfileStore {
        UserProfileStore::new(self.prefs.clone())
    }

    pub fn review_words(&self) -> ReviewWordStore {
        ReviewWordStore::new(self.prefs.clone())
    }

    pub fn onboarding(&self) -> OnboardingStore {
        OnboardingStore::new(self.prefs.clone())
    }
}
