use haru_core::db::migrations::{latest_version, DICTIONARY_MIGRATIONS, PREFERENCES_MIGRATIONS};
use haru_core::db::seed::{table_exists, SeedWriter};
use haru_core::db::{open_dictionary, open_preferences, DbError, SeedConfig};
use haru_core::repo::{DictionaryRepository, Page, SqliteDictionaryRepository};
use haru_core::JlptLevel;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

#[test]
fn first_open_installs_seed_and_migrates() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);
    write_seed(&config, &[("猫", "ねこ")]);

    let handle = open_dictionary(&config).unwrap();
    assert!(config.writable_path.is_file());
    handle.with_conn(|conn| {
        assert_eq!(schema_version(conn), latest_version(DICTIONARY_MIGRATIONS));
        assert!(table_exists(conn, "user_word_state").unwrap());
    });

    let repo = SqliteDictionaryRepository::new(Arc::new(handle));
    let words = repo.fetch_words(None, Page::default()).unwrap();
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].expression, "猫");
}

#[test]
fn reopen_keeps_user_state_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);
    write_seed(&config, &[("猫", "ねこ")]);

    let repo = SqliteDictionaryRepository::new(Arc::new(open_dictionary(&config).unwrap()));
    let id = repo.find_by_expression("猫").unwrap().unwrap().id;
    repo.set_checked(id, true, 1_000).unwrap();
    drop(repo);

    let repo = SqliteDictionaryRepository::new(Arc::new(open_dictionary(&config).unwrap()));
    assert_eq!(repo.checked_word_ids(&[id]).unwrap().len(), 1);
    drop(repo);

    let forced = seed_config(dir.path(), true);
    let repo = SqliteDictionaryRepository::new(Arc::new(open_dictionary(&forced).unwrap()));
    assert!(repo.checked_word_ids(&[id]).unwrap().is_empty());
}

#[test]
fn broken_copy_is_replaced_by_seed_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);
    write_seed(&config, &[("犬", "いぬ")]);

    let conn = Connection::open(&config.writable_path).unwrap();
    conn.execute_batch("CREATE TABLE unrelated (id INTEGER PRIMARY KEY);")
        .unwrap();
    drop(conn);

    let repo = SqliteDictionaryRepository::new(Arc::new(open_dictionary(&config).unwrap()));
    assert!(repo.find_by_expression("犬").unwrap().is_some());
}

#[test]
fn legacy_user_state_table_triggers_recopy() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);
    write_seed(&config, &[("犬", "いぬ")]);

    std::fs::copy(&config.seed_path, &config.writable_path).unwrap();
    let conn = Connection::open(&config.writable_path).unwrap();
    conn.execute_batch("CREATE TABLE user_word_state (word_id INTEGER PRIMARY KEY, is_checked INTEGER);")
        .unwrap();
    drop(conn);

    let handle = open_dictionary(&config).unwrap();
    handle.with_conn(|conn| {
        let columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('user_word_state') WHERE name = 'excluded_until';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(columns, 1);
    });
}

#[test]
fn newer_schema_copy_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);
    write_seed(&config, &[("犬", "いぬ")]);

    std::fs::copy(&config.seed_path, &config.writable_path).unwrap();
    let conn = Connection::open(&config.writable_path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let handle = open_dictionary(&config).unwrap();
    handle.with_conn(|conn| {
        assert_eq!(schema_version(conn), latest_version(DICTIONARY_MIGRATIONS));
    });
}

#[test]
fn missing_seed_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = seed_config(dir.path(), false);

    let err = open_dictionary(&config).unwrap_err();
    assert!(matches!(err, DbError::SeedNotFound(ref path) if path == &config.seed_path));
    assert!(!err.is_schema_error());
    assert!(!config.writable_path.exists());
}

#[test]
fn preferences_file_is_created_with_parent_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("preferences.sqlite3");

    let handle = open_preferences(&path).unwrap();
    assert!(path.is_file());
    handle.with_conn(|conn| {
        assert!(table_exists(conn, "kv_entries").unwrap());
        assert_eq!(schema_version(conn), latest_version(PREFERENCES_MIGRATIONS));
    });
}

fn seed_config(root: &Path, force_copy: bool) -> SeedConfig {
    SeedConfig {
        seed_path: root.join("bundle").join("jlpt_starter.sqlite"),
        writable_path: root.join("data").join("jlpt_starter.sqlite"),
        force_copy,
    }
}

fn write_seed(config: &SeedConfig, words: &[(&str, &str)]) {
    std::fs::create_dir_all(config.seed_path.parent().unwrap()).unwrap();
    std::fs::create_dir_all(config.writable_path.parent().unwrap()).unwrap();
    let mut writer = SeedWriter::create(&config.seed_path).unwrap();
    for (expression, reading) in words {
        writer
            .add_word(expression, reading, JlptLevel::N5, &["뜻"])
            .unwrap();
    }
    writer.finish().unwrap();
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
