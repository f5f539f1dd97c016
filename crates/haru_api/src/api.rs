//! Use-case API consumed by the mobile front end.
//!
//! # Responsibility
//! - Expose screen-level operations (home deck, word list, detail, profile,
//!   settings, reset) over the core services.
//! - Turn every failure into a response envelope with a display message.
//!
//! # Invariants
//! - Exported functions never panic and never return `Err`.
//! - Messages are user-facing Korean placeholders; diagnostics go to logs.
//! - Ids cross the boundary as `i64`, levels as `N5`..`N1` strings.

use chrono::{DateTime, Local, TimeZone};
use haru_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, init_logging_with,
    CoreConfig,
    ExclusionWindow, HaruCore, JlptLevel, RepoError, UserProfile, WordId, WordSummary,
};
use log::warn;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const MSG_DECK_FAILED: &str = "오늘의 추천을 불러오지 못했습니다.";
const MSG_DECK_EMPTY: &str = "추천할 단어가 없습니다.";
const MSG_WORDS_FAILED: &str = "단어를 불러오지 못했습니다.";
const MSG_DETAIL_MISSING: &str = "단어 정보를 찾을 수 없습니다.";
const MSG_DETAIL_FAILED: &str = "단어 정보를 불러오지 못했습니다.";
const MSG_SAVE_FAILED: &str = "저장하지 못했습니다.";
const MSG_INVALID_LEVEL: &str = "지원하지 않는 레벨입니다.";
const MSG_INVALID_DAYS: &str = "제외 기간은 7일, 14일, 30일 중 하나여야 합니다.";
const MSG_RESET_DONE: &str = "학습 데이터를 초기화했습니다.";
const MSG_RESET_FAILED: &str = "학습 데이터를 초기화하지 못했습니다.";

/// Related words shown per kanji on the detail screen.
const RELATED_WORDS_PER_KANJI: u32 = 5;

static SHARED_API: OnceLock<HaruApi> = OnceLock::new();

/// Returns the core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes file logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is a no-op.
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.trim()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Process-wide API opened from `HARU_*` environment configuration.
///
/// Malformed overrides fall back to defaults with a warning. Logging starts
/// with the configured level under the configured data directory.
pub fn shared_api() -> &'static HaruApi {
    SHARED_API.get_or_init(|| {
        let config = CoreConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=api status=fallback error={err}");
            CoreConfig::default()
        });
        open_with_logging(&config)
    })
}

fn open_with_logging(config: &CoreConfig) -> HaruApi {
    if let Err(err) = init_logging_with(config) {
        warn!("event=logging_init module=api status=error error={err}");
    }
    HaruApi::open(config)
}

/// One word card or list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordItem {
    pub word_id: i64,
    pub level: String,
    pub expression: String,
    pub reading: String,
    pub meanings: String,
    pub is_checked: bool,
    pub is_review: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricItem {
    pub inspired_by: String,
    pub ja_line: String,
    pub ko_line: String,
    pub target_expression: String,
    pub target_reading: String,
    pub target_meaning: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckResponse {
    pub ok: bool,
    pub date: String,
    pub cards: Vec<WordItem>,
    pub lyric: Option<LyricItem>,
    /// Card id occupying the lyric slot, if any.
    pub lyric_word_id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListResponse {
    pub ok: bool,
    pub items: Vec<WordItem>,
    /// Levels present before filtering, easiest first.
    pub available_levels: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedGroup {
    pub kanji: String,
    pub items: Vec<WordItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDetailResponse {
    pub ok: bool,
    pub item: Option<WordItem>,
    pub meanings: Vec<String>,
    pub related: Vec<RelatedGroup>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResponse {
    pub ok: bool,
    /// State after the call; unchanged on failure.
    pub active: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub home_deck_level: String,
    pub exclude_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupStatus {
    pub ok: bool,
    pub message: String,
}

/// Screen-level operations over one [`HaruCore`].
pub struct HaruApi {
    core: HaruCore,
}

impl HaruApi {
    pub fn open(config: &CoreConfig) -> Self {
        Self::from_core(HaruCore::open(config))
    }

    pub fn from_core(core: HaruCore) -> Self {
        Self { core }
    }

    /// Whether the dictionary opened; the message carries the reason if not.
    pub fn startup_status(&self) -> StartupStatus {
        match self.core.startup_error() {
            None => StartupStatus {
                ok: true,
                message: String::new(),
            },
            Some(reason) => StartupStatus {
                ok: false,
                message: reason.to_string(),
            },
        }
    }

    pub fn today_deck(&self) -> DeckResponse {
        self.today_deck_at(&Local::now())
    }

    /// Today's deck as seen at `now`, in `now`'s timezone.
    pub fn today_deck_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DeckResponse {
        let review = self.core.review_words().load();
        match self.core.deck_service().todays_cards(now) {
            Ok(deck) => {
                let cards = deck
                    .cards
                    .iter()
                    .map(|card| to_word_item(card, deck.is_checked(card.id), &review))
                    .collect::<Vec<_>>();
                let message = if cards.is_empty() {
                    MSG_DECK_EMPTY.to_string()
                } else {
                    String::new()
                };
                DeckResponse {
                    ok: true,
                    date: deck.snapshot.date,
                    cards,
                    lyric: deck.lyric.map(|lyric| LyricItem {
                        inspired_by: lyric.inspired_by,
                        ja_line: lyric.ja_line,
                        ko_line: lyric.ko_line,
                        target_expression: lyric.target_expression,
                        target_reading: lyric.target_reading,
                        target_meaning: lyric.target_meaning_ko,
                    }),
                    lyric_word_id: deck.snapshot.lyric_word_id,
                    message,
                }
            }
            Err(err) => {
                log_failure("today_deck", &err);
                DeckResponse {
                    ok: false,
                    date: haru_core::model::deck::day_key(now),
                    cards: Vec::new(),
                    lyric: None,
                    lyric_word_id: None,
                    message: MSG_DECK_FAILED.to_string(),
                }
            }
        }
    }

    /// Lists or searches words; `levels = None` keeps all levels.
    ///
    /// Unknown level strings are ignored.
    pub fn list_words(&self, query: String, levels: Option<Vec<String>>) -> WordListResponse {
        let levels = levels.map(|raw| {
            raw.iter()
                .filter_map(|level| JlptLevel::parse(level))
                .collect::<BTreeSet<_>>()
        });
        let listing = match self
            .core
            .word_service()
            .list_words(query.trim(), levels.as_ref())
        {
            Ok(listing) => listing,
            Err(err) => {
                log_failure("list_words", &err);
                return WordListResponse {
                    ok: false,
                    items: Vec::new(),
                    available_levels: Vec::new(),
                    message: MSG_WORDS_FAILED.to_string(),
                };
            }
        };

        let ids = listing.words.iter().map(|word| word.id).collect::<Vec<_>>();
        let checked = self
            .core
            .dictionary()
            .checked_word_ids(&ids)
            .unwrap_or_else(|err| {
                log_failure("list_words", &err);
                BTreeSet::new()
            });
        let review = self.core.review_words().load();
        WordListResponse {
            ok: true,
            items: listing
                .words
                .iter()
                .map(|word| to_word_item(word, checked.contains(&word.id), &review))
                .collect(),
            available_levels: listing
                .available_levels
                .iter()
                .map(|level| level.as_str().to_string())
                .collect(),
            message: String::new(),
        }
    }

    /// Words flagged for review that still resolve, in id order.
    pub fn review_list(&self) -> WordListResponse {
        let review = self.core.review_words().load();
        let dictionary = self.core.dictionary();
        let mut items = Vec::with_capacity(review.len());
        for word_id in &review {
            match dictionary.fetch_word_summary(*word_id) {
                Ok(Some(word)) => items.push(to_word_item(&word, false, &review)),
                Ok(None) => {}
                Err(err) => {
                    log_failure("review_list", &err);
                    return WordListResponse {
                        ok: false,
                        items: Vec::new(),
                        available_levels: Vec::new(),
                        message: MSG_WORDS_FAILED.to_string(),
                    };
                }
            }
        }
        let ids = items.iter().map(|item| item.word_id).collect::<Vec<_>>();
        if let Ok(checked) = dictionary.checked_word_ids(&ids) {
            for item in &mut items {
                item.is_checked = checked.contains(&item.word_id);
            }
        }
        WordListResponse {
            ok: true,
            items,
            available_levels: Vec::new(),
            message: String::new(),
        }
    }

    pub fn word_detail(&self, word_id: i64) -> WordDetailResponse {
        let review = self.core.review_words().load();
        match self
            .core
            .word_service()
            .word_detail(word_id, RELATED_WORDS_PER_KANJI)
        {
            Ok(Some(view)) => {
                let summary = WordSummary {
                    id: view.detail.id,
                    level: view.detail.level,
                    expression: view.detail.expression.clone(),
                    reading: view.detail.reading.clone(),
                    meanings: view.detail.meanings_joined(),
                };
                WordDetailResponse {
                    ok: true,
                    item: Some(to_word_item(&summary, view.is_checked, &review)),
                    meanings: view
                        .detail
                        .meanings
                        .into_iter()
                        .map(|meaning| meaning.text)
                        .collect(),
                    related: view
                        .related
                        .into_iter()
                        .map(|group| RelatedGroup {
                            kanji: group.kanji,
                            items: group
                                .words
                                .iter()
                                .map(|word| to_word_item(word, false, &review))
                                .collect(),
                        })
                        .collect(),
                    message: String::new(),
                }
            }
            Ok(None) => detail_failure(MSG_DETAIL_MISSING),
            Err(err) => {
                log_failure("word_detail", &err);
                detail_failure(MSG_DETAIL_FAILED)
            }
        }
    }

    pub fn toggle_checked(&self, word_id: i64) -> ToggleResponse {
        self.toggle_checked_at(word_id, &Local::now())
    }

    pub fn toggle_checked_at<Tz: TimeZone>(&self, word_id: i64, now: &DateTime<Tz>) -> ToggleResponse {
        let deck = self.core.deck_service();
        match deck.toggle_checked(word_id, now) {
            Ok(active) => ToggleResponse {
                ok: true,
                active,
                message: String::new(),
            },
            Err(err) => {
                log_failure("toggle_checked", &err);
                ToggleResponse {
                    ok: false,
                    active: deck.is_checked(word_id).unwrap_or(false),
                    message: MSG_SAVE_FAILED.to_string(),
                }
            }
        }
    }

    pub fn toggle_review(&self, word_id: i64) -> ToggleResponse {
        ToggleResponse {
            ok: true,
            active: self.core.review_words().toggle(word_id),
            message: String::new(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        self.core.profile().load()
    }

    pub fn update_nickname(&self, nickname: String) -> ActionResponse {
        self.core.profile().set_nickname(&nickname);
        ActionResponse::success(String::new())
    }

    pub fn update_bio(&self, bio: String) -> ActionResponse {
        self.core.profile().set_bio(&bio);
        ActionResponse::success(String::new())
    }

    pub fn update_instagram(&self, instagram_id: String) -> ActionResponse {
        self.core.profile().set_instagram_id(&instagram_id);
        ActionResponse::success(String::new())
    }

    /// Empty bytes clear the avatar.
    pub fn update_avatar(&self, avatar: Vec<u8>) -> ActionResponse {
        let avatar = if avatar.is_empty() {
            None
        } else {
            Some(avatar.as_slice())
        };
        self.core.profile().set_avatar(avatar);
        ActionResponse::success(String::new())
    }

    pub fn settings(&self) -> SettingsResponse {
        let settings = self.core.settings().load();
        SettingsResponse {
            home_deck_level: settings.home_deck_level.as_str().to_string(),
            exclude_days: settings.exclusion_window.days(),
        }
    }

    /// Takes effect with the next day's deck.
    pub fn set_home_deck_level(&self, level: String) -> ActionResponse {
        match JlptLevel::parse(&level) {
            Some(level) => {
                self.core.settings().set_home_deck_level(level);
                ActionResponse::success(String::new())
            }
            None => ActionResponse::failure(MSG_INVALID_LEVEL),
        }
    }

    pub fn set_exclude_days(&self, days: i64) -> ActionResponse {
        match ExclusionWindow::from_days(days) {
            Some(window) => {
                self.core.settings().set_exclusion_window(window);
                ActionResponse::success(String::new())
            }
            None => ActionResponse::failure(MSG_INVALID_DAYS),
        }
    }

    pub fn onboarding_completed(&self) -> bool {
        self.core.onboarding().is_completed()
    }

    pub fn complete_onboarding(&self) -> ActionResponse {
        self.core.onboarding().set_completed(true);
        ActionResponse::success(String::new())
    }

    /// Clears checked words and today's deck; review flags are kept.
    pub fn reset_learning_data(&self) -> ActionResponse {
        match self.core.deck_service().reset_learning_data() {
            Ok(_) => ActionResponse::success(MSG_RESET_DONE),
            Err(err) => {
                log_failure("reset_learning_data", &err);
                ActionResponse::failure(MSG_RESET_FAILED)
            }
        }
    }
}

fn to_word_item(word: &WordSummary, is_checked: bool, review: &BTreeSet<WordId>) -> WordItem {
    WordItem {
        word_id: word.id,
        level: word.level.as_str().to_string(),
        expression: word.expression.clone(),
        reading: word.reading.clone(),
        meanings: word.meanings.clone(),
        is_checked,
        is_review: review.contains(&word.id),
    }
}

fn detail_failure(message: &str) -> WordDetailResponse {
    WordDetailResponse {
        ok: false,
        item: None,
        meanings: Vec::new(),
        related: Vec::new(),
        message: message.to_string(),
    }
}

fn log_failure(operation: &str, err: &RepoError) {
    warn!("event={operation} module=api status=error error={err}");
}
