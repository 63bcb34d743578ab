//! Error types for CLI operations.

use contracts::ContractError;
use dispatcher::DispatcherError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Command-line override conflicts with the configuration
    #[error("Invalid override: {message}")]
    InvalidOverride { message: String },

    /// Merge run error (configuration, cancellation, source or sink)
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Output sink error
    #[error("Output failed: {0}")]
    Dispatcher(#[from] DispatcherError),

    /// Worker task ended abnormally
    #[error("Merge worker failed: {message}")]
    Worker { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_override(message: impl Into<String>) -> Self {
        Self::InvalidOverride {
            message: message.into(),
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
