//! Process configuration read from the environment

use crate::llm::LlmConfig;
use crate::session::Mode;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Mode a new session starts in
    pub default_mode: Mode,
    /// Directory for daily rolling log files; stdout only when unset
    pub log_dir: Option<PathBuf>,
    /// Number of prior messages sent to the LLM as context
    pub history_limit: usize,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_mode: Mode::default(),
            log_dir: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("DESKMATE_PORT") {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "DESKMATE_PORT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let default_mode = match lookup("DESKMATE_DEFAULT_MODE") {
            Some(value) => value.parse().map_err(|e: crate::error::UnreachableModeError| {
                ConfigError::Invalid {
                    var: "DESKMATE_DEFAULT_MODE",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => Mode::default(),
        };

        let history_limit = match lookup("DESKMATE_HISTORY_LIMIT") {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "DESKMATE_HISTORY_LIMIT",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_HISTORY_LIMIT,
        };

        let mut llm = LlmConfig::from_lookup(&lookup);
        if let Some(value) = lookup("LLM_TIMEOUT_SECS") {
            let secs: u64 = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "LLM_TIMEOUT_SECS",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "LLM_TIMEOUT_SECS",
                    value,
                    reason: "must be at least 1 second".to_string(),
                });
            }
            llm.request_timeout = Duration::from_secs(secs);
        }

        let log_dir = lookup("DESKMATE_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            default_mode,
            log_dir,
            history_limit,
            llm,
        })
    }
}
