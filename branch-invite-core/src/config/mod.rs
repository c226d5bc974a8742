//! Configuration for the invite host
//!
//! Defaults, a TOML file, or `BRANCH_INVITE_<SECTION>_<KEY>` environment
//! variables. Every source goes through [`Config::validate`].

use crate::logging::{LogConfig, LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider loading
    pub load: LoadConfig,

    /// Logging
    pub logging: LoggingConfig,
}

/// How the host drives provider loads and selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Deadline for one provider to answer a load
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Segment message shown when a provider misses the deadline
    pub timeout_message: String,

    /// Most contacts one invite may be addressed to
    pub max_selection: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Event rendering (full, compact, json)
    pub format: LogFormat,

    /// Include timestamps
    pub timestamps: bool,

    /// Include the emitting module
    pub targets: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            timeout_message: "Loading took too long. Pull to try again.".to_string(),
            max_selection: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            timestamps: true,
            targets: true,
        }
    }
}

impl LoggingConfig {
    /// Build the logging subsystem settings
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level = LogLevel::parse(&self.level).ok_or_else(|| {
            ConfigError::ValidationFailed(format!("Invalid log level: {}", self.level))
        })?;

        Ok(LogConfig::new(level)
            .format(self.format)
            .timestamps(self.timestamps)
            .targets(self.targets))
    }
}

fn parse_env<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnv {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Example: `BRANCH_INVITE_LOAD_TIMEOUT_MS=5000`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_env::<u64>("BRANCH_INVITE_LOAD_TIMEOUT_MS")? {
            config.load.timeout = Duration::from_millis(ms);
        }
        if let Ok(message) = env::var("BRANCH_INVITE_LOAD_TIMEOUT_MESSAGE") {
            config.load.timeout_message = message;
        }
        if let Some(max) = parse_env("BRANCH_INVITE_LOAD_MAX_SELECTION")? {
            config.load.max_selection = max;
        }

        if let Ok(level) = env::var("BRANCH_INVITE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = parse_env("BRANCH_INVITE_LOG_FORMAT")? {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::Write {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load.timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "load timeout must be greater than 0".to_string(),
            ));
        }

        if self.load.max_selection == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_selection must be greater than 0".to_string(),
            ));
        }

        if self.load.timeout_message.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "timeout_message must not be empty".to_string(),
            ));
        }

        self.logging.to_log_config()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.load.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.load.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config = Config::default();
        config.load.max_selection = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.load.timeout_message = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invite.toml");

        let mut config = Config::default();
        config.load.timeout = Duration::from_millis(2500);
        config.load.max_selection = 25;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invite.toml");
        std::fs::write(&path, "[load]\ntimeout = \"3s\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.load.timeout, Duration::from_secs(3));
        assert_eq!(config.load.max_selection, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/invite.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_to_log_config() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            ..Default::default()
        };
        let log_config = logging.to_log_config().unwrap();
        assert_eq!(log_config.level, LogLevel::Warn);
        assert_eq!(log_config.format, LogFormat::Json);
    }
}
