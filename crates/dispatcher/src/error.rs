//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink worker stopped before the batch could be queued
    #[error("sink '{sink_name}' is closed")]
    SinkClosed { sink_name: String },

    /// One or more writes failed during the sink's lifetime
    #[error("sink '{sink_name}' failed {failures} write(s), last: {last_error}")]
    WriteFailed {
        sink_name: String,
        failures: u64,
        last_error: String,
    },

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] ContractError),

    /// Delimited-text writer error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<DispatcherError> for ContractError {
    fn from(err: DispatcherError) -> Self {
        match err {
            DispatcherError::Contract(inner) => inner,
            DispatcherError::Io(inner) => ContractError::Io(inner),
            DispatcherError::SinkClosed { sink_name } => {
                ContractError::sink_write(sink_name, "sink closed")
            }
            DispatcherError::WriteFailed {
                sink_name,
                last_error,
                ..
            } => ContractError::sink_write(sink_name, last_error),
            other => ContractError::Other(other.to_string()),
        }
    }
}
