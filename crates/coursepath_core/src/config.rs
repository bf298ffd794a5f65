//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Defaults never depend on the working directory.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "COURSEPATH_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COURSEPATH_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "COURSEPATH_LOG_DIR";
pub const ENV_SEED_PATH: &str = "COURSEPATH_SEED_PATH";

const DEFAULT_DB_FILE_NAME: &str = "coursepath.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "coursepath-logs";

/// Process-level settings for database, logging and catalog seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Must be absolute for `init_logging`.
    pub log_dir: PathBuf,
    /// Seed document loaded on startup when set.
    pub seed_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl CoreConfig {
    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)),
            seed_path: read(ENV_SEED_PATH).map(PathBuf::from),
        }
    }
}
