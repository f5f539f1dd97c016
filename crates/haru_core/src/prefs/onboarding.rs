//! First-launch flag.

use crate::prefs::Preferences;

pub const ONBOARDING_COMPLETED_KEY: &str = "onboarding_completed";

#[derive(Debug, Clone)]
pub struct OnboardingStore {
    prefs: Preferences,
}

impl OnboardingStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn is_completed(&self) -> bool {
        self.prefs
            .read_bool(ONBOARDING_COMPLETED_KEY)
            .unwrap_or(false)
    }

    pub fn set_completed(&self, completed: bool) {
        self.prefs.write_bool(ONBOARDING_COMPLETED_KEY, completed);
    }
}
