//! Profile attributes stored one key per field.

use crate::model::profile::{UserProfile, DEFAULT_NICKNAME};
use crate::prefs::Preferences;

pub const NICKNAME_KEY: &str = "profile_nickname";
pub const BIO_KEY: &str = "profile_bio";
pub const INSTAGRAM_KEY: &str = "profile_instagram";
pub const AVATAR_KEY: &str = "profile_avatar_data";

#[derive(Debug, Clone)]
pub struct UserProfileStore {
    prefs: Preferences,
}

impl UserProfileStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn load(&self) -> UserProfile {
        let nickname = self
            .prefs
            .read_string(NICKNAME_KEY)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NICKNAME.to_string());
        UserProfile {
            nickname,
            bio: self.prefs.read_string(BIO_KEY).unwrap_or_default(),
            instagram_id: self.prefs.read_string(INSTAGRAM_KEY).unwrap_or_default(),
            avatar: self.prefs.read_bytes(AVATAR_KEY),
        }
    }

    pub fn save(&self, profile: &UserProfile) {
        self.set_nickname(&profile.nickname);
        self.set_bio(&profile.bio);
        self.set_instagram_id(&profile.instagram_id);
        self.set_avatar(profile.avatar.as_deref());
    }

    pub fn set_nickname(&self, nickname: &str) {
        self.prefs.write_string(NICKNAME_KEY, nickname.trim());
    }

    pub fn set_bio(&self, bio: &str) {
        self.prefs.write_string(BIO_KEY, bio);
    }

    /// Stores the handle without a leading `@`.
    pub fn set_instagram_id(&self, instagram_id: &str) {
        let normalized = instagram_id.trim().trim_start_matches('@');
        self.prefs.write_string(INSTAGRAM_KEY, normalized);
    }

    /// `None` removes the stored avatar.
    pub fn set_avatar(&self, avatar: Option<&[u8]>) {
        match avatar {
            Some(bytes) => self.prefs.write_bytes(AVATAR_KEY, bytes),
            None => self.prefs.remove(AVATAR_KEY),
        }
    }
}
