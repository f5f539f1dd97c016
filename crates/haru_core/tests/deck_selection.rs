use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use haru_core::db::open_dictionary_in_memory;
use haru_core::db::seed::{replace_meanings, upsert_lyric, upsert_word};
use haru_core::prefs::{AppSettingsStore, HomeDeckStore};
use haru_core::repo::{LyricRepository, SqliteDictionaryRepository, SqliteLyricRepository};
use haru_core::{
    DeckService, DictionaryRepository, ExclusionWindow, JlptLevel, LyricEntry, Preferences,
    WordId, DECK_SIZE,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

struct Harness {
    service: DeckService,
    repo: Arc<SqliteDictionaryRepository>,
    lyrics: Arc<dyn LyricRepository>,
    prefs: Preferences,
}

impl Harness {
    fn settings(&self) -> AppSettingsStore {
        AppSettingsStore::new(self.prefs.clone())
    }

    /// Another service over the same stores, as handed out per API call.
    fn new_service(&self) -> DeckService {
        DeckService::new(
            self.repo.clone(),
            Arc::clone(&self.lyrics),
            self.settings(),
            HomeDeckStore::new(self.prefs.clone()),
        )
    }
}

fn harness(words: &[(&str, JlptLevel)], lyric_target: Option<&str>) -> (Harness, Vec<WordId>) {
    let handle = Arc::new(open_dictionary_in_memory().unwrap());
    let ids = handle.with_conn(|conn| {
        let ids = words
            .iter()
            .map(|(expression, level)| {
                let id = upsert_word(conn, expression, "よみ", *level).unwrap();
                replace_meanings(conn, id, &["뜻"]).unwrap();
                id
            })
            .collect::<Vec<_>>();
        if let Some(target) = lyric_target {
            upsert_lyric(conn, &lyric(target)).unwrap();
        }
        ids
    });

    let repo = Arc::new(SqliteDictionaryRepository::new(Arc::clone(&handle)));
    let lyrics: Arc<dyn LyricRepository> = Arc::new(SqliteLyricRepository::new(handle));
    let prefs = Preferences::in_memory();
    let service = DeckService::new(
        repo.clone(),
        Arc::clone(&lyrics),
        AppSettingsStore::new(prefs.clone()),
        HomeDeckStore::new(prefs.clone()),
    );
    (
        Harness {
            service,
            repo,
            lyrics,
            prefs,
        },
        ids,
    )
}

fn lyric(target: &str) -> LyricEntry {
    LyricEntry {
        id: "lyric-1".to_string(),
        inspired_by: "봄노래".to_string(),
        ja_line: format!("{target}が鳴いている"),
        ko_line: "울고 있어".to_string(),
        target_expression: target.to_string(),
        target_reading: "ねこ".to_string(),
        target_meaning_ko: "고양이".to_string(),
        target_jlpt: "N5".to_string(),
        tags: String::new(),
    }
}

fn numbered(prefix: &str, count: usize, level: JlptLevel) -> Vec<(String, JlptLevel)> {
    (0..count).map(|i| (format!("{prefix}{i}"), level)).collect()
}

fn borrowed(words: &[(String, JlptLevel)]) -> Vec<(&str, JlptLevel)> {
    words.iter().map(|(e, l)| (e.as_str(), *l)).collect()
}

fn kst(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

#[test]
fn small_store_yields_short_deck_without_error() {
    let (h, ids) = harness(
        &[
            ("一", JlptLevel::N5),
            ("二", JlptLevel::N5),
            ("三", JlptLevel::N5),
            ("四", JlptLevel::N3),
        ],
        None,
    );

    let deck = h.service.todays_deck(&kst(2024, 5, 20, 9, 0)).unwrap();
    assert_eq!(deck.word_ids.len(), 3);
    assert_eq!(
        deck.word_ids.iter().copied().collect::<BTreeSet<_>>(),
        BTreeSet::from([ids[0], ids[1], ids[2]])
    );
    assert_eq!(deck.lyric_word_id, None);
}

#[test]
fn deck_is_stable_within_a_day_and_rebuilt_on_rollover() {
    let words = numbered("語", 40, JlptLevel::N5);
    let (h, _) = harness(&borrowed(&words), None);

    let morning = h.service.todays_deck(&kst(2024, 5, 20, 0, 5)).unwrap();
    assert_eq!(morning.date, "2024-05-20");
    assert_eq!(morning.word_ids.len(), DECK_SIZE);
    for hour in [6, 12, 23] {
        assert_eq!(h.service.todays_deck(&kst(2024, 5, 20, hour, 59)).unwrap(), morning);
    }

    let next_day = h.service.todays_deck(&kst(2024, 5, 21, 0, 0)).unwrap();
    assert_eq!(next_day.date, "2024-05-21");
    assert_eq!(next_day.word_ids.len(), DECK_SIZE);
    assert_eq!(h.service.todays_deck(&kst(2024, 5, 21, 18, 0)).unwrap(), next_day);
}

#[test]
fn day_boundary_follows_caller_timezone() {
    let words = numbered("語", 20, JlptLevel::N5);
    let (h, _) = harness(&borrowed(&words), None);

    // 2024-05-20T15:30Z is already the 21st in Seoul.
    let instant = chrono::Utc.with_ymd_and_hms(2024, 5, 20, 15, 30, 0).unwrap();
    let seoul = instant.with_timezone(&FixedOffset::east_opt(9 * 3600).unwrap());
    assert_eq!(h.service.todays_deck(&seoul).unwrap().date, "2024-05-21");
}

#[test]
fn checked_words_follow_the_exclusion_window() {
    let (h, ids) = harness(
        &[
            ("古い", JlptLevel::N5),
            ("新しい", JlptLevel::N5),
            ("未学習", JlptLevel::N5),
        ],
        None,
    );
    let today = kst(2024, 5, 20, 9, 0);
    h.repo
        .set_checked(ids[0], true, (today - Duration::days(10)).timestamp_millis())
        .unwrap();
    h.repo
        .set_checked(ids[1], true, (today - Duration::days(3)).timestamp_millis())
        .unwrap();

    let excluded = h.service.excluded_word_ids(&today).unwrap();
    assert_eq!(excluded, BTreeSet::from([ids[1]]));
    let deck = h.service.todays_deck(&today).unwrap();
    assert_eq!(
        deck.word_ids.iter().copied().collect::<BTreeSet<_>>(),
        BTreeSet::from([ids[0], ids[2]])
    );

    h.settings().set_exclusion_window(ExclusionWindow::TwoWeeks);
    assert_eq!(
        h.service.excluded_word_ids(&today).unwrap(),
        BTreeSet::from([ids[0], ids[1]])
    );
}

#[test]
fn excluded_word_returns_only_after_window_elapses() {
    let (h, ids) = harness(&[("休む", JlptLevel::N5), ("働く", JlptLevel::N5)], None);
    let checked_on = kst(2024, 5, 1, 21, 0);
    h.repo
        .set_checked(ids[0], true, checked_on.timestamp_millis())
        .unwrap();

    for offset in 0..7 {
        let day = kst(2024, 5, 1 + offset, 8, 0);
        let deck = h.service.todays_deck(&day).unwrap();
        assert!(!deck.word_ids.contains(&ids[0]), "day +{offset}");
        assert_eq!(deck.word_ids, vec![ids[1]]);
    }
    let deck = h.service.todays_deck(&kst(2024, 5, 8, 8, 0)).unwrap();
    assert!(deck.word_ids.contains(&ids[0]));
}

#[test]
fn active_exclusion_marks_are_respected() {
    let (h, ids) = harness(&[("雨", JlptLevel::N5), ("雪", JlptLevel::N5)], None);
    let now = kst(2024, 5, 20, 9, 0);
    h.repo
        .set_excluded_until(ids[0], Some((now + Duration::days(2)).timestamp_millis()), 0)
        .unwrap();

    assert_eq!(h.service.todays_deck(&now).unwrap().word_ids, vec![ids[1]]);

    let later = now + Duration::days(3);
    let deck = h.service.todays_deck(&later).unwrap();
    assert_eq!(deck.word_ids.len(), 2);
}

#[test]
fn lyric_word_takes_first_slot_when_eligible() {
    let mut words = numbered("語", 15, JlptLevel::N5);
    words.push(("猫".to_string(), JlptLevel::N4));
    let (h, ids) = harness(&borrowed(&words), Some("猫"));
    let cat = *ids.last().unwrap();

    let now = kst(2024, 5, 20, 9, 0);
    let deck = h.service.todays_deck(&now).unwrap();
    assert_eq!(deck.lyric_word_id, Some(cat));
    assert_eq!(deck.word_ids[0], cat);
    assert_eq!(deck.word_ids.len(), DECK_SIZE);
    assert_eq!(
        deck.word_ids.iter().copied().collect::<BTreeSet<_>>().len(),
        DECK_SIZE
    );

    let cards = h.service.todays_cards(&now).unwrap();
    assert_eq!(cards.cards[0].expression, "猫");
    assert_eq!(cards.lyric.unwrap().target_expression, "猫");
}

#[test]
fn checked_lyric_word_gives_up_its_slot() {
    let mut words = numbered("語", 15, JlptLevel::N5);
    words.push(("猫".to_string(), JlptLevel::N5));
    let (h, ids) = harness(&borrowed(&words), Some("猫"));
    let cat = *ids.last().unwrap();

    let now = kst(2024, 5, 20, 9, 0);
    h.repo
        .set_checked(cat, true, (now - Duration::days(30)).timestamp_millis())
        .unwrap();

    let deck = h.service.todays_deck(&now).unwrap();
    assert_eq!(deck.lyric_word_id, None);
    assert!(!deck.word_ids.contains(&cat));
    assert_eq!(deck.word_ids.len(), DECK_SIZE);
}

#[test]
fn unknown_lyric_target_leaves_all_slots_random() {
    let words = numbered("語", 12, JlptLevel::N5);
    let (h, _) = harness(&borrowed(&words), Some("存在しない"));

    let now = kst(2024, 5, 20, 9, 0);
    let deck = h.service.todays_deck(&now).unwrap();
    assert_eq!(deck.lyric_word_id, None);
    assert_eq!(deck.word_ids.len(), DECK_SIZE);
    assert!(h.service.todays_lyric(&now).is_some());
}

#[test]
fn level_change_applies_from_next_day() {
    let mut words = numbered("易", 12, JlptLevel::N5);
    words.extend(numbered("難", 12, JlptLevel::N4));
    let (h, ids) = harness(&borrowed(&words), None);
    let n4 = ids[12..].iter().copied().collect::<BTreeSet<_>>();

    let today = h.service.todays_deck(&kst(2024, 5, 20, 9, 0)).unwrap();
    h.settings().set_home_deck_level(JlptLevel::N4);
    assert_eq!(h.service.todays_deck(&kst(2024, 5, 20, 10, 0)).unwrap(), today);

    let tomorrow = h.service.todays_deck(&kst(2024, 5, 21, 9, 0)).unwrap();
    assert!(tomorrow.word_ids.iter().all(|id| n4.contains(id)));
}

#[test]
fn toggle_twice_restores_checked_state() {
    let (h, ids) = harness(&[("花", JlptLevel::N5)], None);
    let now = kst(2024, 5, 20, 9, 0);

    assert!(!h.service.is_checked(ids[0]).unwrap());
    assert!(h.service.toggle_checked(ids[0], &now).unwrap());
    assert!(h.service.is_checked(ids[0]).unwrap());
    assert!(!h.service.toggle_checked(ids[0], &now).unwrap());
    assert!(!h.service.is_checked(ids[0]).unwrap());

    let deck = h.service.todays_cards(&now).unwrap();
    assert!(!deck.is_checked(ids[0]));
}

#[test]
fn reset_clears_checks_and_snapshot() {
    let words = numbered("語", 12, JlptLevel::N5);
    let (h, ids) = harness(&borrowed(&words), None);
    let now = kst(2024, 5, 20, 9, 0);

    h.service.todays_deck(&now).unwrap();
    h.service.toggle_checked(ids[0], &now).unwrap();
    h.service.toggle_checked(ids[1], &now).unwrap();

    assert_eq!(h.service.reset_learning_data().unwrap(), 2);
    assert!(h.repo.user_word_states().unwrap().is_empty());
    assert!(HomeDeckStore::new(h.prefs.clone()).load().is_none());
    assert_eq!(h.service.todays_deck(&now).unwrap().word_ids.len(), DECK_SIZE);
}

#[test]
fn concurrent_callers_share_one_deck_per_day() {
    const THREADS: usize = 8;
    let words = numbered("語", 200, JlptLevel::N5);
    let (h, _) = harness(&borrowed(&words), None);
    let decks = HomeDeckStore::new(h.prefs.clone());

    for day in 1..=10 {
        let now = kst(2024, 5, day, 9, 0);
        let barrier = Barrier::new(THREADS);
        let results = thread::scope(|scope| {
            let handles = (0..THREADS)
                .map(|_| {
                    let service = h.new_service();
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        service.todays_deck(&now).unwrap()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        let persisted = decks.load().unwrap();
        assert_eq!(persisted.date, format!("2024-05-{day:02}"));
        assert!(
            results.iter().all(|deck| *deck == persisted),
            "day {day}: callers saw different decks"
        );
    }
}

#[test]
fn concurrent_toggles_never_lose_a_flip() {
    const THREADS: usize = 8;
    let (h, ids) = harness(&[("花", JlptLevel::N5)], None);
    let now = kst(2024, 5, 20, 9, 0);
    let barrier = Barrier::new(THREADS);

    let results = thread::scope(|scope| {
        let handles = (0..THREADS)
            .map(|_| {
                let service = h.new_service();
                let barrier = &barrier;
                let word_id = ids[0];
                scope.spawn(move || {
                    barrier.wait();
                    service.toggle_checked(word_id, &now).unwrap()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(results.iter().filter(|checked| **checked).count(), THREADS / 2);
    assert!(!h.service.is_checked(ids[0]).unwrap());
}
