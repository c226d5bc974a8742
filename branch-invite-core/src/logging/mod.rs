//! Logging subsystem
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` overrides the
//! configured level when set. Events are written to stderr so stdout stays
//! free for command output.

use std::io;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

mod error;
mod format;
mod level;

pub use error::LoggingError;
pub use format::LogFormat;
pub use level::LogLevel;

/// Settings for the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Prefix every event with the wall-clock time
    pub timestamps: bool,
    /// Show the module that emitted each event
    pub targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            format: LogFormat::default(),
            timestamps: true,
            targets: true,
        }
    }

    pub fn format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    pub fn timestamps(self, enabled: bool) -> Self {
        Self {
            timestamps: enabled,
            ..self
        }
    }

    pub fn targets(self, enabled: bool) -> Self {
        Self {
            targets: enabled,
            ..self
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(self.targets);

        match (self.format, self.timestamps) {
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
        }
    }
}

/// Initialize logging at `info` in the full format
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize logging with custom settings
///
/// Fails if a global subscriber is already installed.
///
/// # Example
/// ```
/// use branch_invite_core::logging::{init_logging_with_config, LogConfig, LogFormat, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug)
///     .format(LogFormat::Compact)
///     .targets(false);
///
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    tracing_subscriber::registry()
        .with(config.layer())
        .with(config.filter())
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}
