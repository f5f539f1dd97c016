//! Seed dictionary schema and writer.
//!
//! # Responsibility
//! - Define the read-only reference schema shipped inside the app bundle.
//! - Build seed files: idempotent word upsert, full meaning replacement,
//!   lyric entries.
//! - Verify that an opened database still has the columns core reads.
//!
//! # Invariants
//! - `(expression, reading, level)` identifies a word; re-upserting returns
//!   the existing id.
//! - Meaning `ord` starts at 1 and follows input order.

use crate::db::{DbError, DbResult};
use crate::model::lyric::LyricEntry;
use crate::model::word::{JlptLevel, WordId};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

const SEED_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS word (
    id INTEGER PRIMARY KEY,
    expression TEXT NOT NULL,
    reading TEXT NOT NULL,
    level TEXT NOT NULL CHECK (level IN ('N5', 'N4', 'N3', 'N2', 'N1')),
    UNIQUE (expression, reading, level)
);
CREATE TABLE IF NOT EXISTS meaning (
    id INTEGER PRIMARY KEY,
    word_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    ord INTEGER NOT NULL,
    FOREIGN KEY (word_id) REFERENCES word (id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS lyric_entries (
    id TEXT PRIMARY KEY NOT NULL,
    inspired_by TEXT NOT NULL DEFAULT '',
    ja_line TEXT NOT NULL,
    ko_line TEXT NOT NULL DEFAULT '',
    target_expression TEXT NOT NULL DEFAULT '',
    target_reading TEXT NOT NULL DEFAULT '',
    target_meaning_ko TEXT NOT NULL DEFAULT '',
    target_jlpt TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_word_expression ON word (expression);
CREATE INDEX IF NOT EXISTS idx_word_reading ON word (reading);
";

const REQUIRED_SEED_COLUMNS: &[(&str, &[&str])] = &[
    ("word", &["id", "level", "expression", "reading"]),
    ("meaning", &["word_id", "ord", "text"]),
];

const REQUIRED_USER_STATE_COLUMNS: &[(&str, &[&str])] = &[(
    "user_word_state",
    &[
        "word_id",
        "is_checked",
        "checked_at",
        "updated_at",
        "excluded_until",
    ],
)];

/// Creates seed tables when absent.
pub fn create_seed_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SEED_SCHEMA_SQL)?;
    Ok(())
}

/// Inserts a word unless it already exists and returns its id either way.
pub fn upsert_word(
    conn: &Connection,
    expression: &str,
    reading: &str,
    level: JlptLevel,
) -> DbResult<WordId> {
    conn.execute(
        "INSERT OR IGNORE INTO word (expression, reading, level) VALUES (?1, ?2, ?3);",
        params![expression, reading, level.as_str()],
    )?;
    let id = conn.query_row(
        "SELECT id FROM word WHERE expression = ?1 AND reading = ?2 AND level = ?3;",
        params![expression, reading, level.as_str()],
        |row| row.get::<_, WordId>(0),
    )?;
    Ok(id)
}

/// Replaces the whole meaning list of `word_id` in one transaction.
pub fn replace_meanings(conn: &mut Connection, word_id: WordId, meanings: &[&str]) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM meaning WHERE word_id = ?1;", [word_id])?;
    {
        let mut stmt = tx.prepare("INSERT INTO meaning (word_id, text, ord) VALUES (?1, ?2, ?3);")?;
        for (index, text) in meanings.iter().enumerate() {
            stmt.execute(params![word_id, text, index as i64 + 1])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Inserts or replaces one lyric entry.
pub fn upsert_lyric(conn: &Connection, lyric: &LyricEntry) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO lyric_entries (
            id,
            inspired_by,
            ja_line,
            ko_line,
            target_expression,
            target_reading,
            target_meaning_ko,
            target_jlpt,
            tags
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            lyric.id,
            lyric.inspired_by,
            lyric.ja_line,
            lyric.ko_line,
            lyric.target_expression,
            lyric.target_reading,
            lyric.target_meaning_ko,
            lyric.target_jlpt,
            lyric.tags,
        ],
    )?;
    Ok(())
}

/// Verifies reference tables before migrations touch the database.
pub fn verify_seed_schema(conn: &Connection) -> DbResult<()> {
    verify_columns(conn, REQUIRED_SEED_COLUMNS)
}

/// Verifies user-state tables after migrations ran.
pub fn verify_user_state_schema(conn: &Connection) -> DbResult<()> {
    verify_columns(conn, REQUIRED_USER_STATE_COLUMNS)
}

/// Returns whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn verify_columns(conn: &Connection, required: &[(&str, &[&str])]) -> DbResult<()> {
    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(DbError::SchemaMismatch(format!("missing table `{table}`")));
        }
        let present = table_columns(conn, table)?;
        if let Some(missing) = columns.iter().find(|column| !present.contains(**column)) {
            return Err(DbError::SchemaMismatch(format!(
                "missing column `{table}.{missing}`"
            )));
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(names)
}

/// File-backed seed builder used by the dictionary packaging step.
pub struct SeedWriter {
    conn: Connection,
}

impl SeedWriter {
    /// Creates (or reopens) a seed file and ensures its schema.
    pub fn create(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get::<_, String>(0))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
        create_seed_schema(&conn)?;
        info!(
            "event=seed_open module=db status=ok path={}",
            path.display()
        );
        Ok(Self { conn })
    }

    /// Adds one word with its meanings; returns the stable word id.
    pub fn add_word(
        &mut self,
        expression: &str,
        reading: &str,
        level: JlptLevel,
        meanings: &[&str],
    ) -> DbResult<WordId> {
        let word_id = upsert_word(&self.conn, expression, reading, level)?;
        replace_meanings(&mut self.conn, word_id, meanings)?;
        Ok(word_id)
    }

    pub fn add_lyric(&self, lyric: &LyricEntry) -> DbResult<()> {
        upsert_lyric(&self.conn, lyric)
    }

    /// Checkpoints WAL content into the main file and closes the writer.
    ///
    /// The seed must be a single self-contained file before it is bundled.
    pub fn finish(self) -> DbResult<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
        self.conn
            .query_row("PRAGMA journal_mode = DELETE;", [], |row| row.get::<_, String>(0))?;
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        create_seed_schema, replace_meanings, upsert_word, verify_seed_schema,
        verify_user_state_schema,
    };
    use crate::db::DbError;
    use crate::model::word::JlptLevel;
    use rusqlite::Connection;

    #[test]
    fn upsert_word_returns_existing_id() {
        let conn = Connection::open_in_memory().unwrap();
        create_seed_schema(&conn).unwrap();

        let first = upsert_word(&conn, "水", "みず", JlptLevel::N5).unwrap();
        let again = upsert_word(&conn, "水", "みず", JlptLevel::N5).unwrap();
        let other = upsert_word(&conn, "水", "すい", JlptLevel::N4).unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn replace_meanings_rewrites_order() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_seed_schema(&conn).unwrap();
        let id = upsert_word(&conn, "本", "ほん", JlptLevel::N5).unwrap();

        replace_meanings(&mut conn, id, &["book", "volume"]).unwrap();
        replace_meanings(&mut conn, id, &["main"]).unwrap();

        let rows: Vec<(i64, String)> = conn
            .prepare("SELECT ord, text FROM meaning WHERE word_id = ?1 ORDER BY ord")
            .unwrap()
            .query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![(1, "main".to_string())]);
    }

    #[test]
    fn verify_reports_missing_tables_and_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let err = verify_seed_schema(&conn).unwrap_err();
        assert!(matches!(err, DbError::SchemaMismatch(ref msg) if msg.contains("word")));

        conn.execute_batch(
            "CREATE TABLE user_word_state (word_id INTEGER PRIMARY KEY, excluded_until INTEGER);",
        )
        .unwrap();
        let err = verify_user_state_schema(&conn).unwrap_err();
        assert!(matches!(err, DbError::SchemaMismatch(ref msg) if msg.contains("is_checked")));
    }
}
