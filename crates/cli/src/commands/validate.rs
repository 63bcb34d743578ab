//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::MergeBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    files: usize,
    selected_channels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick_channel: Option<String>,
    streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<String>,
    output: String,
}

impl ConfigSummary {
    fn from_blueprint(blueprint: &MergeBlueprint) -> Self {
        let merge = blueprint.to_merge_config();
        Self {
            files: blueprint.inputs.files.len(),
            selected_channels: merge.selected_channels,
            timestamp_channel: merge.timestamp_channel,
            tick_channel: merge.tick_channel,
            streaming: blueprint.output.streaming,
            frequency_hz: blueprint.output.frequency_hz,
            trigger: blueprint
                .trigger
                .as_ref()
                .map(|t| format!("{} > {}", t.channel, t.threshold)),
            output: blueprint.output.path.display().to_string(),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let mut warnings = config_loader::warnings(&blueprint);
            warnings.extend(missing_inputs(&blueprint));

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary::from_blueprint(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Input files that do not exist yet; the run skips them
fn missing_inputs(blueprint: &MergeBlueprint) -> Vec<String> {
    blueprint
        .inputs
        .files
        .iter()
        .filter(|path| !path.exists())
        .map(|path| format!("input file '{}' does not exist and will be skipped", path.display()))
        .collect()
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Files: {}", summary.files);
            println!("  Channels: {}", summary.selected_channels.join(", "));
            if let Some(ref channel) = summary.timestamp_channel {
                println!("  Timestamp: {channel}");
            }
            if let Some(ref channel) = summary.tick_channel {
                println!("  Tick: {channel}");
            }
            if let Some(ref trigger) = summary.trigger {
                println!("  Trigger: {trigger}");
            }
            match summary.frequency_hz {
                Some(hz) => println!("  Frequency: {hz} Hz"),
                None => println!("  Frequency: native"),
            }
            println!("  Streaming: {}", summary.streaming);
            println!("  Output: {}", summary.output);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
