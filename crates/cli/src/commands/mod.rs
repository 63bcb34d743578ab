//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::MergeBlueprint;

use crate::error::CliError;

/// Load and validate a configuration file
fn load_blueprint(path: &Path) -> Result<MergeBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Single-byte delimiter for the csv reader and writer
fn delimiter_byte(delimiter: char) -> std::result::Result<u8, CliError> {
    u8::try_from(delimiter)
        .map_err(|_| CliError::invalid_override(format!("delimiter {delimiter:?} is not ASCII")))
}
