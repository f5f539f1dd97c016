//! Deck settings persisted as individual keys.

use crate::model::profile::AppSettings;
use crate::model::user_state::ExclusionWindow;
use crate::model::word::JlptLevel;
use crate::prefs::Preferences;

pub const HOME_DECK_LEVEL_KEY: &str = "settings_home_deck_level";
pub const EXCLUDE_DAYS_KEY: &str = "settings_exclude_days";

/// Reads and writes [`AppSettings`].
///
/// Unknown level strings read as N5; day counts outside {7, 14, 30} read
/// as one week.
#[derive(Debug, Clone)]
pub struct AppSettingsStore {
    prefs: Preferences,
}

impl AppSettingsStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn load(&self) -> AppSettings {
        AppSettings {
            home_deck_level: self.home_deck_level(),
            exclusion_window: self.exclusion_window(),
        }
    }

    pub fn save(&self, settings: &AppSettings) {
        self.set_home_deck_level(settings.home_deck_level);
        self.set_exclusion_window(settings.exclusion_window);
    }

    pub fn home_deck_level(&self) -> JlptLevel {
        self.prefs
            .read_string(HOME_DECK_LEVEL_KEY)
            .and_then(|raw| JlptLevel::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_home_deck_level(&self, level: JlptLevel) {
        self.prefs.write_string(HOME_DECK_LEVEL_KEY, level.as_str());
    }

    pub fn exclusion_window(&self) -> ExclusionWindow {
        self.prefs
            .read_i64(EXCLUDE_DAYS_KEY)
            .and_then(ExclusionWindow::from_days)
            .unwrap_or_default()
    }

    pub fn set_exclusion_window(&self, window: ExclusionWindow) {
        self.prefs.write_i64(EXCLUDE_DAYS_KEY, window.days());
    }
}

#[cfg(test)]
mod tests {
    use super::{AppSettingsStore, EXCLUDE_DAYS_KEY, HOME_DECK_LEVEL_KEY};
    use crate::model::user_state::ExclusionWindow;
    use crate::model::word::JlptLevel;
    use crate::prefs::Preferences;

    #[test]
    fn defaults_apply_to_missing_and_invalid_values() {
        let prefs = Preferences::in_memory();
        let store = AppSettingsStore::new(prefs.clone());
        assert_eq!(store.home_deck_level(), JlptLevel::N5);
        assert_eq!(store.exclusion_window(), ExclusionWindow::OneWeek);

        prefs.write_string(HOME_DECK_LEVEL_KEY, "N9");
        prefs.write_i64(EXCLUDE_DAYS_KEY, 10);
        assert_eq!(store.home_deck_level(), JlptLevel::N5);
        assert_eq!(store.exclusion_window(), ExclusionWindow::OneWeek);

        store.set_home_deck_level(JlptLevel::N2);
        store.set_exclusion_window(ExclusionWindow::OneMonth);
        let loaded = store.load();
        assert_eq!(loaded.home_deck_level, JlptLevel::N2);
        assert_eq!(loaded.exclusion_window, ExclusionWindow::OneMonth);
    }
}
