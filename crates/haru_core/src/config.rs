//! Runtime configuration for the core stores.
//!
//! # Responsibility
//! - Resolve where the dictionary seed, the writable dictionary copy, the
//!   preference file and the log directory live.
//! - Apply `HARU_*` environment overrides on top of explicit values.
//!
//! # Invariants
//! - Resolved paths are never empty.
//! - Override parsing is strict: malformed values are errors, not defaults.

use crate::db::SeedConfig;
use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "HARU_DATA_DIR";
pub const SEED_PATH_ENV: &str = "HARU_SEED_PATH";
pub const LOG_LEVEL_ENV: &str = "HARU_LOG_LEVEL";
pub const FORCE_SEED_COPY_ENV: &str = "HARU_FORCE_SEED_COPY";

/// File name of the bundled dictionary seed and of its writable copy.
pub const DICTIONARY_FILE_NAME: &str = "jlpt_starter.sqlite";
pub const PREFERENCES_FILE_NAME: &str = "preferences.sqlite3";
const DEFAULT_DATA_DIR_NAME: &str = "haru";
const LOG_DIR_NAME: &str = "logs";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Override variable is set but blank.
    EmptyValue { var: &'static str },
    InvalidBool { var: &'static str, value: String },
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(f, "`{var}` is set but empty"),
            Self::InvalidBool { var, value } => {
                write!(f, "`{var}` must be one of 1|0|true|false, got `{value}`")
            }
            Self::InvalidLogLevel(level) => write!(f, "unsupported log level `{level}`"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved locations and switches for one core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// App-writable directory holding the dictionary copy, preferences and logs.
    pub data_dir: PathBuf,
    /// Read-only seed shipped with the app.
    pub seed_path: PathBuf,
    pub log_level: String,
    /// Recopy the seed on every open.
    pub force_seed_copy: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME);
        Self {
            seed_path: data_dir.join("seed").join(DICTIONARY_FILE_NAME),
            data_dir,
            log_level: default_log_level().to_string(),
            force_seed_copy: false,
        }
    }
}

impl CoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>, seed_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            seed_path: seed_path.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies `HARU_*` overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(raw) = lookup(DATA_DIR_ENV) {
            self.data_dir = non_empty_path(DATA_DIR_ENV, &raw)?;
        }
        if let Some(raw) = lookup(SEED_PATH_ENV) {
            self.seed_path = non_empty_path(SEED_PATH_ENV, &raw)?;
        }
        if let Some(raw) = lookup(LOG_LEVEL_ENV) {
            self.log_level = parse_log_level(&raw)?;
        }
        if let Some(raw) = lookup(FORCE_SEED_COPY_ENV) {
            self.force_seed_copy = parse_bool(FORCE_SEED_COPY_ENV, &raw)?;
        }
        Ok(self)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.data_dir.join(DICTIONARY_FILE_NAME)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn seed_config(&self) -> SeedConfig {
        SeedConfig {
            seed_path: self.seed_path.clone(),
            writable_path: self.dictionary_path(),
            force_copy: self.force_seed_copy,
        }
    }
}

fn non_empty_path(var: &'static str, raw: &str) -> ConfigResult<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue { var });
    }
    Ok(PathBuf::from(trimmed))
}

fn parse_log_level(raw: &str) -> ConfigResult<String> {
    normalize_level(raw)
        .map(str::to_string)
        .map_err(|_| ConfigError::InvalidLogLevel(raw.trim().to_string()))
}

fn parse_bool(var: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DATA_DIR_ENV, FORCE_SEED_COPY_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = CoreConfig::new("/base", "/bundle/jlpt_starter.sqlite")
            .with_overrides(lookup(&[
                (DATA_DIR_ENV, " /data/haru "),
                (LOG_LEVEL_ENV, "DEBUG"),
                (FORCE_SEED_COPY_ENV, "true"),
            ]))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/data/haru"));
        assert_eq!(config.seed_path, PathBuf::from("/bundle/jlpt_starter.sqlite"));
        assert_eq!(config.log_level, "debug");
        assert!(config.force_seed_copy);
        assert_eq!(
            config.dictionary_path(),
            PathBuf::from("/data/haru/jlpt_starter.sqlite")
        );
        assert_eq!(config.seed_config().writable_path, config.dictionary_path());
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let err = CoreConfig::default()
            .with_overrides(lookup(&[(FORCE_SEED_COPY_ENV, "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));

        let err = CoreConfig::default()
            .with_overrides(lookup(&[(DATA_DIR_ENV, "   ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyValue { var: DATA_DIR_ENV });

        let err = CoreConfig::default()
            .with_overrides(lookup(&[(LOG_LEVEL_ENV, "verbose")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("verbose".to_string()));
    }
}
