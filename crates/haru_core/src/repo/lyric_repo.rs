//! Lyric-of-the-day repository.
//!
//! # Invariants
//! - The daily entry is `(day_of_year * 997) % count` in `id` order, so one
//!   calendar day always maps to the same entry for a fixed corpus.
//! - A store without `lyric_entries` (or with no rows) yields `None`.

use crate::db::seed::table_exists;
use crate::db::DbHandle;
use crate::model::lyric::LyricEntry;
use crate::repo::dictionary_repo::RepoResult;
use std::sync::Arc;

const DAY_STRIDE: i64 = 997;

/// Read access to the rotating lyric corpus.
pub trait LyricRepository: Send + Sync {
    /// Entry for the given 1-based day of year.
    fn lyric_for_day(&self, day_of_year: u32) -> RepoResult<Option<LyricEntry>>;
}

/// Picks the corpus offset for one day.
pub fn daily_offset(day_of_year: u32, count: i64) -> Option<i64> {
    if count <= 0 {
        return None;
    }
    Some((i64::from(day_of_year) * DAY_STRIDE).rem_euclid(count))
}

/// SQLite-backed lyric repository sharing the dictionary handle.
#[derive(Debug, Clone)]
pub struct SqliteLyricRepository {
    db: Arc<DbHandle>,
}

impl SqliteLyricRepository {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

impl LyricRepository for SqliteLyricRepository {
    fn lyric_for_day(&self, day_of_year: u32) -> RepoResult<Option<LyricEntry>> {
        self.db.with_conn(|conn| -> RepoResult<Option<LyricEntry>> {
            if !table_exists(conn, "lyric_entries")? {
                return Ok(None);
            }
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM lyric_entries;", [], |row| row.get(0))?;
            let Some(offset) = daily_offset(day_of_year, count) else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT
                    id,
                    inspired_by,
                    ja_line,
                    ko_line,
                    target_expression,
                    target_reading,
                    target_meaning_ko,
                    target_jlpt,
                    tags
                 FROM lyric_entries
                 ORDER BY id ASC
                 LIMIT 1 OFFSET ?1;",
            )?;
            let mut rows = stmt.query([offset])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            Ok(Some(LyricEntry {
                id: row.get("id")?,
                inspired_by: row.get("inspired_by")?,
                ja_line: row.get("ja_line")?,
                ko_line: row.get("ko_line")?,
                target_expression: row.get("target_expression")?,
                target_reading: row.get("target_reading")?,
                target_meaning_ko: row.get("target_meaning_ko")?,
                target_jlpt: row.get("target_jlpt")?,
                tags: row.get("tags")?,
            }))
        })
    }
}

/// Lyric repository with an empty corpus.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubLyricRepository;

impl LyricRepository for StubLyricRepository {
    fn lyric_for_day(&self, _day_of_year: u32) -> RepoResult<Option<LyricEntry>> {
        Ok(None)
    }
}
