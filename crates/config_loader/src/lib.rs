//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON merge configuration files
//! - Validate configuration legality
//! - Generate `MergeBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("merge.toml")).unwrap();
//! println!("Files: {}", blueprint.inputs.files.len());
//! ```

mod parser;
mod validator;

pub use contracts::MergeBlueprint;
pub use parser::ConfigFormat;
pub use validator::warnings;

use contracts::ContractError;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    /// Relative input and output paths are resolved against the config file's directory.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<MergeBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = Self::read_file(path)?;
        let mut blueprint = Self::load_from_str(&content, format)?;
        if let Some(base) = path.parent() {
            Self::resolve_paths(&mut blueprint, base);
        }
        Ok(blueprint)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MergeBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Re-run validation, e.g. after CLI overrides were applied
    pub fn validate(blueprint: &MergeBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize MergeBlueprint to TOML string
    pub fn to_toml(blueprint: &MergeBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize MergeBlueprint to JSON string
    pub fn to_json(blueprint: &MergeBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MergeBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    fn resolve_paths(blueprint: &mut MergeBlueprint, base: &Path) {
        let resolve = |p: &PathBuf| -> PathBuf {
            if p.is_relative() {
                base.join(p)
            } else {
                p.clone()
            }
        };
        blueprint.inputs.files = blueprint.inputs.files.iter().map(resolve).collect();
        blueprint.output.path = resolve(&blueprint.output.path);
    }
}
