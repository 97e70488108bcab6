//! Runtime configuration resolved from environment variables.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `EWM_DB_PATH` | SQLite file path | in-memory database |
//! | `EWM_LOG_LEVEL` | `trace\|debug\|info\|warn\|error` | `default_log_level()` |
//! | `EWM_LOG_DIR` | absolute log directory | logging disabled |
//! | `EWM_PAGE_LIMIT` | default list page size | `10` |

use crate::logging::{default_log_level, normalize_level};
use crate::service::compilation_query::DEFAULT_PAGE_LIMIT;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "EWM_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EWM_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EWM_LOG_DIR";
pub const ENV_PAGE_LIMIT: &str = "EWM_PAGE_LIMIT";

/// Resolved core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
    pub page_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(limit) = read(ENV_PAGE_LIMIT) {
            config.page_limit = parse_page_limit(&limit)?;
        }
        Ok(config)
    }
}

fn parse_page_limit(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(0) => Err(format!("{ENV_PAGE_LIMIT} must be greater than zero")),
        Ok(limit) => Ok(limit),
        Err(err) => Err(format!("{ENV_PAGE_LIMIT} must be a positive integer, got `{value}`: {err}")),
    }
}
