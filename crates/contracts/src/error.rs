//! Layered error definitions
//!
//! Categorized by source: config / time / source / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Time Errors =====
    /// No timestamp representation recovered any value
    #[error("unparsable time series in column '{column}'")]
    UnparsableSeries { column: String },

    /// No baseline fallback produced a value
    #[error("baseline unresolved: {message}")]
    BaselineUnresolved { message: String },

    /// Reference and output concatenations disagree in length
    #[error("alignment length mismatch: reference={reference}, output={output}")]
    AlignmentLengthMismatch { reference: usize, output: usize },

    /// Resampling requested but not possible
    #[error("downsample skipped: {reason}")]
    DownsampleSkipped { reason: String },

    // ===== Source Errors =====
    /// Per-file read failure
    #[error("failed to read source '{file}': {message}")]
    SourceRead { file: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== Run Control =====
    /// Run cancelled at a file boundary
    #[error("run cancelled after {files_done} of {files_total} files")]
    Cancelled { files_done: usize, files_total: usize },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unparsable series error
    pub fn unparsable(column: impl Into<String>) -> Self {
        Self::UnparsableSeries {
            column: column.into(),
        }
    }

    /// Create baseline unresolved error
    pub fn baseline_unresolved(message: impl Into<String>) -> Self {
        Self::BaselineUnresolved {
            message: message.into(),
        }
    }

    /// Create downsample skipped error
    pub fn downsample_skipped(reason: impl Into<String>) -> Self {
        Self::DownsampleSkipped {
            reason: reason.into(),
        }
    }

    /// Create source read error
    pub fn source_read(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Degraded conditions never abort a run; they are logged and the run continues.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            Self::UnparsableSeries { .. }
                | Self::BaselineUnresolved { .. }
                | Self::AlignmentLengthMismatch { .. }
                | Self::DownsampleSkipped { .. }
                | Self::SourceRead { .. }
        )
    }

    /// Stable short name used for metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::UnparsableSeries { .. } => "unparsable_series",
            Self::BaselineUnresolved { .. } => "baseline_unresolved",
            Self::AlignmentLengthMismatch { .. } => "alignment_length_mismatch",
            Self::DownsampleSkipped { .. } => "downsample_skipped",
            Self::SourceRead { .. } => "source_read",
            Self::SinkWrite { .. } => "sink_write",
            Self::Cancelled { .. } => "cancelled",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
