//! SourceReader trait - file-reader collaborator interface
//!
//! A reader turns one source file into named columns. Names must already be
//! cleaned and de-duplicated (first occurrence wins).

use std::path::Path;

use crate::{ContractError, SourceTable};

/// Per-file table reader
///
/// Implementations are synchronous; the run worker calls them once per file,
/// between cancellation checks.
pub trait SourceReader: Send + Sync {
    /// Reader name (used for logging)
    fn name(&self) -> &str;

    /// Read one file
    ///
    /// # Errors
    /// Returns `ContractError::SourceRead` when the file cannot be read; the run
    /// skips the file and continues.
    fn read(&self, path: &Path) -> Result<SourceTable, ContractError>;
}
