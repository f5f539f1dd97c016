//! Dictionary repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Translate typed lookups (by level, substring, id, random sample,
//!   kanji recommendation) into parameterized SQL.
//! - Own `user_word_state` mutations (checked flag, excluded-until marks).
//!
//! # Invariants
//! - Every call runs inside one serialized `DbHandle::with_conn` section.
//! - List ordering is deterministic: `expression ASC, id ASC`.
//! - Kanji recommendations order by level distance, expression length, id.
//! - Summary meanings are the full `ord`-ordered list, even for searches that
//!   matched on a single meaning.

use crate::db::{DbError, DbHandle};
use crate::model::user_state::UserWordState;
use crate::model::word::{JlptLevel, Meaning, WordDetail, WordId, WordSummary};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Single-id sampling attempts allowed per `random_word_ids` call.
pub const RANDOM_SAMPLE_MAX_ATTEMPTS: usize = 50;

const WORD_SUMMARY_SELECT_SQL: &str = "SELECT
    w.id AS id,
    w.level AS level,
    w.expression AS expression,
    w.reading AS reading,
    COALESCE((
        SELECT GROUP_CONCAT(m.text, ' / ' ORDER BY m.ord, m.id)
        FROM meaning m
        WHERE m.word_id = w.id
    ), '') AS meanings
FROM word w";

const LEVEL_RANK_SQL: &str = "CASE w.level
    WHEN 'N1' THEN 1
    WHEN 'N2' THEN 2
    WHEN 'N3' THEN 3
    WHEN 'N4' THEN 4
    ELSE 5
END";

const USER_STATE_SELECT_SQL: &str = "SELECT
    word_id,
    is_checked,
    checked_at,
    updated_at,
    excluded_until
FROM user_word_state";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for dictionary and user-state operations.
#[derive(Debug)]
pub enum RepoError {
    /// Store could not be opened at startup; carries the reason.
    StoreUnavailable(String),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(reason) => write!(f, "dictionary store unavailable: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted word data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::StoreUnavailable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options; `limit = None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }
}

/// Repository interface consumed by services and the front-end API.
pub trait DictionaryRepository: Send + Sync {
    /// Lists words, optionally restricted to one level.
    fn fetch_words(&self, level: Option<JlptLevel>, page: Page) -> RepoResult<Vec<WordSummary>>;
    /// Substring search over expression, reading and meanings.
    ///
    /// A blank query behaves exactly like [`DictionaryRepository::fetch_words`].
    fn search_words(
        &self,
        level: Option<JlptLevel>,
        query: &str,
        page: Page,
    ) -> RepoResult<Vec<WordSummary>>;
    fn fetch_word_detail(&self, word_id: WordId) -> RepoResult<Option<WordDetail>>;
    fn fetch_word_summary(&self, word_id: WordId) -> RepoResult<Option<WordSummary>>;
    /// Exact expression lookup; lowest id wins on duplicates.
    fn find_by_expression(&self, expression: &str) -> RepoResult<Option<WordSummary>>;
    fn random_word(&self, level: JlptLevel) -> RepoResult<Option<WordSummary>>;
    fn random_words(
        &self,
        limit: u32,
        excluding_expression: Option<&str>,
    ) -> RepoResult<Vec<WordSummary>>;
    /// Samples up to `count` distinct ids at `level` outside `excluding`.
    ///
    /// A result shorter than `count` is valid when the pool runs dry or the
    /// attempt budget is spent.
    fn random_word_ids(
        &self,
        level: JlptLevel,
        count: usize,
        excluding: &BTreeSet<WordId>,
    ) -> RepoResult<Vec<WordId>>;
    /// Words containing `kanji`, closest level first.
    fn recommend_by_kanji(
        &self,
        kanji: &str,
        current_level: JlptLevel,
        excluding_word_id: WordId,
        limit: u32,
    ) -> RepoResult<Vec<WordSummary>>;
    /// Distinct levels present in the store, easiest first.
    fn available_levels(&self) -> RepoResult<Vec<JlptLevel>>;

    /// Subset of `word_ids` currently checked.
    fn checked_word_ids(&self, word_ids: &[WordId]) -> RepoResult<BTreeSet<WordId>>;
    fn set_checked(&self, word_id: WordId, checked: bool, now_ms: i64) -> RepoResult<()>;
    /// Flips the checked flag in one statement; returns the new state.
    ///
    /// A word without a state row becomes checked.
    fn toggle_checked(&self, word_id: WordId, now_ms: i64) -> RepoResult<bool>;
    fn user_word_states(&self) -> RepoResult<Vec<UserWordState>>;
    /// Sets or clears an explicit exclusion deadline for one word.
    fn set_excluded_until(
        &self,
        word_id: WordId,
        until_ms: Option<i64>,
        now_ms: i64,
    ) -> RepoResult<()>;
    /// Ids whose excluded-until deadline is still in the future.
    ///
    /// Expired deadlines are cleared as a side effect.
    fn excluded_until_ids(&self, now_ms: i64) -> RepoResult<BTreeSet<WordId>>;
    /// Deletes every user word state row; returns the number removed.
    fn reset_user_word_state(&self) -> RepoResult<usize>;
}

/// SQLite-backed dictionary repository.
#[derive(Debug, Clone)]
pub struct SqliteDictionaryRepository {
    db: Arc<DbHandle>,
}

impl SqliteDictionaryRepository {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    fn run<T>(
        &self,
        op: &'static str,
        work: impl FnOnce(&mut Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = self.db.with_conn(work);
        if let Err(err) = &result {
            warn!("event=repo_query module=repo status=error op={op} error={err}");
        }
        result
    }
}

impl DictionaryRepository for SqliteDictionaryRepository {
    fn fetch_words(&self, level: Option<JlptLevel>, page: Page) -> RepoResult<Vec<WordSummary>> {
        self.run("fetch_words", |conn| {
            let mut sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();
            push_level_filter(&mut sql, &mut bind_values, level);
            sql.push_str(" ORDER BY w.expression ASC, w.id ASC");
            push_page(&mut sql, &mut bind_values, page);
            query_summaries(conn, &sql, bind_values)
        })
    }

    fn search_words(
        &self,
        level: Option<JlptLevel>,
        query: &str,
        page: Page,
    ) -> RepoResult<Vec<WordSummary>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return self.fetch_words(level, page);
        }

        let pattern = format!("%{}%", escape_like(trimmed));
        self.run("search_words", |conn| {
            let mut sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();
            push_level_filter(&mut sql, &mut bind_values, level);
            sql.push_str(
                " AND (
                    w.expression LIKE ? ESCAPE '\\'
                    OR w.reading LIKE ? ESCAPE '\\'
                    OR EXISTS (
                        SELECT 1
                        FROM meaning mm
                        WHERE mm.word_id = w.id
                          AND mm.text LIKE ? ESCAPE '\\'
                    )
                )",
            );
            for _ in 0..3 {
                bind_values.push(Value::Text(pattern.clone()));
            }
            sql.push_str(" ORDER BY w.expression ASC, w.id ASC");
            push_page(&mut sql, &mut bind_values, page);
            query_summaries(conn, &sql, bind_values)
        })
    }

    fn fetch_word_detail(&self, word_id: WordId) -> RepoResult<Option<WordDetail>> {
        self.run("fetch_word_detail", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, level, expression, reading
                 FROM word
                 WHERE id = ?1;",
            )?;
            let mut rows = stmt.query([word_id])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            let id: WordId = row.get("id")?;
            let level = parse_level_column(row)?;
            let expression: String = row.get("expression")?;
            let reading: String = row.get("reading")?;

            let mut meaning_stmt = conn.prepare(
                "SELECT ord, text
                 FROM meaning
                 WHERE word_id = ?1
                 ORDER BY ord ASC, id ASC;",
            )?;
            let meanings = meaning_stmt
                .query_map([word_id], |row| {
                    Ok(Meaning {
                        ord: row.get("ord")?,
                        text: row.get("text")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(WordDetail {
                id,
                level,
                expression,
                reading,
                meanings,
            }))
        })
    }

    fn fetch_word_summary(&self, word_id: WordId) -> RepoResult<Option<WordSummary>> {
        self.run("fetch_word_summary", |conn| {
            let sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE w.id = ? LIMIT 1");
            let mut found = query_summaries(conn, &sql, vec![Value::Integer(word_id)])?;
            Ok(found.pop())
        })
    }

    fn find_by_expression(&self, expression: &str) -> RepoResult<Option<WordSummary>> {
        self.run("find_by_expression", |conn| {
            let sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE w.expression = ? ORDER BY w.id ASC LIMIT 1");
            let mut found =
                query_summaries(conn, &sql, vec![Value::Text(expression.to_string())])?;
            Ok(found.pop())
        })
    }

    fn random_word(&self, level: JlptLevel) -> RepoResult<Option<WordSummary>> {
        self.run("random_word", |conn| {
            let sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE w.level = ? ORDER BY RANDOM() LIMIT 1");
            let mut found =
                query_summaries(conn, &sql, vec![Value::Text(level.as_str().to_string())])?;
            Ok(found.pop())
        })
    }

    fn random_words(
        &self,
        limit: u32,
        excluding_expression: Option<&str>,
    ) -> RepoResult<Vec<WordSummary>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.run("random_words", |conn| {
            let mut sql = format!("{WORD_SUMMARY_SELECT_SQL} WHERE 1 = 1");
            let mut bind_values: Vec<Value> = Vec::new();
            if let Some(expression) = excluding_expression {
                sql.push_str(" AND w.expression != ?");
                bind_values.push(Value::Text(expression.to_string()));
            }
            sql.push_str(" ORDER BY RANDOM() LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            query_summaries(conn, &sql, bind_values)
        })
    }

    fn random_word_ids(
        &self,
        level: JlptLevel,
        count: usize,
        excluding: &BTreeSet<WordId>,
    ) -> RepoResult<Vec<WordId>> {
        self.run("random_word_ids", |conn| {
            let mut exclusion = excluding.clone();
            let mut results = Vec::with_capacity(count);
            let mut attempts = 0;

            while results.len() < count && attempts < RANDOM_SAMPLE_MAX_ATTEMPTS {
                attempts += 1;
                match random_word_id(conn, level, &exclusion)? {
                    Some(id) => {
                        results.push(id);
                        exclusion.insert(id);
                    }
                    None => break,
                }
            }
            Ok(results)
        })
    }

    fn recommend_by_kanji(
        &self,
        kanji: &str,
        current_level: JlptLevel,
        excluding_word_id: WordId,
        limit: u32,
    ) -> RepoResult<Vec<WordSummary>> {
        let kanji = kanji.trim();
        if kanji.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        self.run("recommend_by_kanji", |conn| {
            let sql = format!(
                "{WORD_SUMMARY_SELECT_SQL}
                 WHERE w.expression LIKE ? ESCAPE '\\'
                   AND w.id != ?
                 ORDER BY ABS(({LEVEL_RANK_SQL}) - ?) ASC,
                          LENGTH(w.expression) ASC,
                          w.id ASC
                 LIMIT ?"
            );
            let bind_values = vec![
                Value::Text(format!("%{}%", escape_like(kanji))),
                Value::Integer(excluding_word_id),
                Value::Integer(current_level.rank()),
                Value::Integer(i64::from(limit)),
            ];
            query_summaries(conn, &sql, bind_values)
        })
    }

    fn available_levels(&self) -> RepoResult<Vec<JlptLevel>> {
        self.run("available_levels", |conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT level FROM word;")?;
            let mut rows = stmt.query([])?;
            let mut levels = BTreeSet::new();
            while let Some(row) = rows.next()? {
                let raw: String = row.get(0)?;
                let level = JlptLevel::parse(&raw).ok_or_else(|| {
                    RepoError::InvalidData(format!("invalid level `{raw}` in word.level"))
                })?;
                levels.insert(level);
            }
            Ok(levels.into_iter().collect())
        })
    }

    fn checked_word_ids(&self, word_ids: &[WordId]) -> RepoResult<BTreeSet<WordId>> {
        if word_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        self.run("checked_word_ids", |conn| {
            let placeholders = vec!["?"; word_ids.len()].join(", ");
            let sql = format!(
                "SELECT word_id
                 FROM user_word_state
                 WHERE word_id IN ({placeholders})
                   AND is_checked = 1;"
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(word_ids.iter()), |row| row.get::<_, WordId>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok(ids)
        })
    }

    fn set_checked(&self, word_id: WordId, checked: bool, now_ms: i64) -> RepoResult<()> {
        self.run("set_checked", |conn| {
            let checked_at = if checked { Some(now_ms) } else { None };
            conn.execute(
                "INSERT INTO user_word_state (word_id, is_checked, checked_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (word_id) DO UPDATE SET
                    is_checked = excluded.is_checked,
                    checked_at = excluded.checked_at,
                    updated_at = excluded.updated_at;",
                params![word_id, bool_to_int(checked), checked_at, now_ms],
            )?;
            Ok(())
        })
    }

    fn toggle_checked(&self, word_id: WordId, now_ms: i64) -> RepoResult<bool> {
        self.run("toggle_checked", |conn| {
            // SET expressions read the pre-update row.
            let checked = conn.query_row(
                "INSERT INTO user_word_state (word_id, is_checked, checked_at, updated_at)
                 VALUES (?1, 1, ?2, ?2)
                 ON CONFLICT (word_id) DO UPDATE SET
                    is_checked = 1 - user_word_state.is_checked,
                    checked_at = CASE
                        WHEN user_word_state.is_checked = 0 THEN excluded.checked_at
                        ELSE NULL
                    END,
                    updated_at = excluded.updated_at
                 RETURNING is_checked;",
                params![word_id, now_ms],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(checked == 1)
        })
    }

    fn user_word_states(&self) -> RepoResult<Vec<UserWordState>> {
        self.run("user_word_states", |conn| {
            let mut stmt = conn.prepare(&format!("{USER_STATE_SELECT_SQL} ORDER BY word_id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut states = Vec::new();
            while let Some(row) = rows.next()? {
                states.push(parse_user_state_row(row)?);
            }
            Ok(states)
        })
    }

    fn set_excluded_until(
        &self,
        word_id: WordId,
        until_ms: Option<i64>,
        now_ms: i64,
    ) -> RepoResult<()> {
        self.run("set_excluded_until", |conn| {
            conn.execute(
                "INSERT INTO user_word_state (word_id, is_checked, excluded_until, updated_at)
                 VALUES (?1, 0, ?2, ?3)
                 ON CONFLICT (word_id) DO UPDATE SET
                    excluded_until = excluded.excluded_until,
                    updated_at = excluded.updated_at;",
                params![word_id, until_ms, now_ms],
            )?;
            Ok(())
        })
    }

    fn excluded_until_ids(&self, now_ms: i64) -> RepoResult<BTreeSet<WordId>> {
        self.run("excluded_until_ids", |conn| {
            conn.execute(
                "UPDATE user_word_state
                 SET excluded_until = NULL,
                     updated_at = ?1
                 WHERE excluded_until IS NOT NULL
                   AND excluded_until <= ?1;",
                [now_ms],
            )?;
            let mut stmt = conn.prepare(
                "SELECT word_id
                 FROM user_word_state
                 WHERE excluded_until IS NOT NULL
                   AND excluded_until > ?1;",
            )?;
            let ids = stmt
                .query_map([now_ms], |row| row.get::<_, WordId>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok(ids)
        })
    }

    fn reset_user_word_state(&self) -> RepoResult<usize> {
        self.run("reset_user_word_state", |conn| {
            let removed = conn.execute("DELETE FROM user_word_state;", [])?;
            Ok(removed)
        })
    }
}

fn random_word_id(
    conn: &Connection,
    level: JlptLevel,
    excluding: &BTreeSet<WordId>,
) -> RepoResult<Option<WordId>> {
    let mut sql = String::from("SELECT w.id FROM word w WHERE w.level = ?");
    let mut bind_values: Vec<Value> = vec![Value::Text(level.as_str().to_string())];
    if !excluding.is_empty() {
        let placeholders = vec!["?"; excluding.len()].join(", ");
        sql.push_str(&format!(" AND w.id NOT IN ({placeholders})"));
        bind_values.extend(excluding.iter().map(|id| Value::Integer(*id)));
    }
    sql.push_str(" ORDER BY RANDOM() LIMIT 1");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

fn push_level_filter(sql: &mut String, bind_values: &mut Vec<Value>, level: Option<JlptLevel>) {
    if let Some(level) = level {
        sql.push_str(" AND w.level = ?");
        bind_values.push(Value::Text(level.as_str().to_string()));
    }
}

fn push_page(sql: &mut String, bind_values: &mut Vec<Value>, page: Page) {
    if let Some(limit) = page.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if page.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.offset)));
        }
    } else if page.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(page.offset)));
    }
}

fn query_summaries(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<WordSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut words = Vec::new();
    while let Some(row) = rows.next()? {
        words.push(parse_summary_row(row)?);
    }
    Ok(words)
}

fn parse_summary_row(row: &Row<'_>) -> RepoResult<WordSummary> {
    Ok(WordSummary {
        id: row.get("id")?,
        level: parse_level_column(row)?,
        expression: row.get("expression")?,
        reading: row.get("reading")?,
        meanings: row.get("meanings")?,
    })
}

fn parse_level_column(row: &Row<'_>) -> RepoResult<JlptLevel> {
    let raw: String = row.get("level")?;
    JlptLevel::parse(&raw)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid level `{raw}` in word.level")))
}

fn parse_user_state_row(row: &Row<'_>) -> RepoResult<UserWordState> {
    let is_checked = match row.get::<_, i64>("is_checked")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_checked value `{other}` in user_word_state.is_checked"
            )));
        }
    };

    Ok(UserWordState {
        word_id: row.get("word_id")?,
        is_checked,
        checked_at: row.get("checked_at")?,
        updated_at: row.get("updated_at")?,
        excluded_until: row.get("excluded_until")?,
    })
}

/// Escapes LIKE wildcards so user input matches literally (`ESCAPE '\'`).
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
