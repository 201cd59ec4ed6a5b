//! Environment-supplied runtime configuration.
//!
//! # Responsibility
//! - Read storage and notification connection parameters from the
//!   environment.
//! - Reject missing or empty required values with a typed error.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "HOMEDUTY_DB_PATH";
pub const ENV_SERVER_URL: &str = "HOMEDUTY_SERVER_URL";
pub const ENV_LOG_DIR: &str = "HOMEDUTY_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "HOMEDUTY_LOG_LEVEL";

/// Runtime settings for the core services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Location of the local document database file.
    pub db_path: PathBuf,
    /// Base URL of the push-notification server.
    pub server_base_url: String,
    /// Optional log directory; logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    /// Optional log level override.
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Empty(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "required environment variable `{var}` is not set"),
            Self::Empty(var) => write!(f, "environment variable `{var}` is set but empty"),
        }
    }
}

impl Error for ConfigError {}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            db_path: PathBuf::from(required(ENV_DB_PATH)?),
            server_base_url: required(ENV_SERVER_URL)?,
            log_dir: optional(ENV_LOG_DIR).map(PathBuf::from),
            log_level: optional(ENV_LOG_LEVEL),
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty(var)),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::Missing(var)),
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_variable() {
        assert!(ConfigError::Missing(ENV_DB_PATH)
            .to_string()
            .contains(ENV_DB_PATH));
        assert!(ConfigError::Empty(ENV_SERVER_URL)
            .to_string()
            .contains(ENV_SERVER_URL));
    }
}
