//! Host-supplied runtime configuration.
//!
//! # Responsibility
//! - Decode the JSON settings a host passes at startup.
//! - Turn validated settings into an active logger and local cache.
//!
//! # Invariants
//! - Missing fields fall back to defaults; unknown fields are rejected.
//! - `log_dir` and `cache_path`, when present, are absolute.

use crate::cache::{CacheResult, SqliteLocalCache};
use crate::logging::{self, default_log_level, LoggingError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration failures.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
    Logging(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "config parse failed: {err}"),
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Rolling log directory. Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite cache file. An in-memory cache is used when unset.
    pub cache_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            cache_path: None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }
        require_absolute("log_dir", self.log_dir.as_deref())?;
        require_absolute("cache_path", self.cache_path.as_deref())?;
        Ok(())
    }

    /// Starts file logging when `log_dir` is set. Returns whether it did.
    pub fn init_logging(&self) -> ConfigResult<bool> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| ConfigError::Invalid("log_dir must be valid UTF-8".to_string()))?;
        logging::init_logging(&self.log_level, log_dir)?;
        Ok(true)
    }

    /// Opens the configured local cache.
    pub fn open_cache(&self) -> CacheResult<SqliteLocalCache> {
        match &self.cache_path {
            Some(path) => SqliteLocalCache::open(path),
            None => SqliteLocalCache::open_in_memory(),
        }
    }
}

fn require_absolute(field: &str, path: Option<&Path>) -> ConfigResult<()> {
    match path {
        Some(path) if !path.is_absolute() => Err(ConfigError::Invalid(format!(
            "{field} must be an absolute path, got `{}`",
            path.display()
        ))),
        _ => Ok(()),
    }
}
