//! Runtime configuration
//!
//! Defaults suit a single-user desktop install. Every field can be overridden
//! from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `COMPLETIONIST_DB_PATH` | `database_path` |
//! | `COMPLETIONIST_BUSY_TIMEOUT_MS` | `busy_timeout_ms` |
//! | `COMPLETIONIST_LOG` | `log_filter` |

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "COMPLETIONIST_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "COMPLETIONIST_BUSY_TIMEOUT_MS";
pub const ENV_LOG: &str = "COMPLETIONIST_LOG";

/// Upper bound for the busy timeout; anything longer looks like a typo
pub const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_LOG_FILTER: &str = "completionist_core=info";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Database path must not be empty")]
    EmptyDatabasePath,

    #[error("Busy timeout must be between 1 and {max} ms, got {value}")]
    InvalidBusyTimeout { value: u64, max: u64 },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnvValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// `~/.completionist/database/completionist.db`, relative to the working
/// directory when no home directory is known
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".completionist")
        .join("database")
        .join("completionist.db")
}

impl CoreConfig {
    /// Defaults with environment overrides applied, validated
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from any variable source
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnvValue {
                var: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::InvalidBusyTimeout {
                value: self.busy_timeout_ms,
                max: MAX_BUSY_TIMEOUT_MS,
            });
        }
        Ok(())
    }
}
