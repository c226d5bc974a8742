//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur in the logging subsystem
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed, or installing it failed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}
