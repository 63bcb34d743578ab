//! Progress events sent from the worker to the foreground.

use contracts::ResolvedBaseline;
use tracing::{debug, error, info, warn};

/// One progress update of a merge run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        files: usize,
        streaming: bool,
    },
    FileStarted {
        index: usize,
        file: String,
    },
    FileFinished {
        file: String,
        rows_read: usize,
        /// Rows written for this file (streaming only)
        rows_written: Option<usize>,
    },
    FileSkipped {
        file: String,
        reason: String,
    },
    /// Degraded condition; the run continues
    Warning {
        kind: String,
        message: String,
    },
    Completed {
        rows_written: u64,
        baseline: Option<ResolvedBaseline>,
    },
    Failed {
        message: String,
    },
    Cancelled {
        files_done: usize,
        files_total: usize,
    },
}

impl RunEvent {
    /// Log the event on the foreground side
    pub fn render(&self) {
        match self {
            Self::Started { files, streaming } => {
                info!(files, streaming, "merge started")
            }
            Self::FileStarted { index, file } => debug!(index, file = %file, "reading file"),
            Self::FileFinished {
                file,
                rows_read,
                rows_written,
            } => info!(file = %file, rows_read, rows_written = ?rows_written, "file done"),
            Self::FileSkipped { file, reason } => {
                warn!(file = %file, reason = %reason, "file skipped")
            }
            Self::Warning { kind, message } => warn!(kind = %kind, "{message}"),
            Self::Completed {
                rows_written,
                baseline,
            } => info!(
                rows_written,
                baseline_seconds = ?baseline.map(|b| b.absolute_seconds),
                origin = ?baseline.map(|b| b.origin),
                "merge completed"
            ),
            Self::Failed { message } => error!(error = %message, "merge failed"),
            Self::Cancelled {
                files_done,
                files_total,
            } => warn!(files_done, files_total, "merge cancelled"),
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}
