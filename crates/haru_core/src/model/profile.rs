//! User profile and app settings records.

use crate::model::user_state::ExclusionWindow;
use crate::model::word::JlptLevel;
use serde::{Deserialize, Serialize};

/// Nickname shown before the user picks one.
pub const DEFAULT_NICKNAME: &str = "하루";

/// Locally stored profile attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub nickname: String,
    pub bio: String,
    pub instagram_id: String,
    /// Encoded avatar image bytes, as picked by the user.
    pub avatar: Option<Vec<u8>>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            nickname: DEFAULT_NICKNAME.to_string(),
            bio: String::new(),
            instagram_id: String::new(),
            avatar: None,
        }
    }
}

/// Deck-related preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Level the daily deck samples from.
    pub home_deck_level: JlptLevel,
    pub exclusion_window: ExclusionWindow,
}
