//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{output_header, ContractError, MergeBlueprint, TriggerConfig};
use dispatcher::{create_dispatcher, CsvSinkConfig, SinkSpec, WriteMode};
use ingestion::CsvSourceReader;
use observability::RunStatus;
use tracing::{info, warn};

use super::{delimiter_byte, load_blueprint};
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{CancelToken, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut blueprint = load_blueprint(&args.config)?;

    // Apply CLI overrides, then validate the result again
    apply_overrides(&mut blueprint, args)?;
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;
    for warning in config_loader::warnings(&blueprint) {
        warn!("{warning}");
    }

    info!(
        files = blueprint.inputs.files.len(),
        channels = blueprint.channels.selected.len(),
        output = %blueprint.output.path.display(),
        frequency_hz = ?blueprint.output.frequency_hz,
        streaming = blueprint.output.streaming,
        trigger = ?blueprint.trigger.as_ref().map(|t| &t.channel),
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let reader = CsvSourceReader::with_delimiter(delimiter_byte(blueprint.inputs.delimiter)?);
    let dispatcher = create_dispatcher(sink_specs(&blueprint, args.dry_run)?, args.queue_capacity)
        .context("Failed to create output sinks")?;
    let pipeline_config = PipelineConfig::from_blueprint(&blueprint)
        .with_poll_interval(Duration::from_millis(args.poll_ms));

    // Ctrl+C / SIGTERM stop the run at the next file boundary
    let cancel = CancelToken::new();
    let signal_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("Received shutdown signal, stopping after the current file...");
            cancel.cancel();
        })
    };

    info!("Starting merge...");
    let result = Pipeline::new(pipeline_config, reader)
        .run(dispatcher, cancel)
        .await;
    signal_task.abort();

    let stats = result.context("Merge failed")?;
    stats.print_summary();

    if stats.status() == RunStatus::Cancelled {
        return Err(ContractError::Cancelled {
            files_done: stats.metrics.files_processed as usize + stats.metrics.files_skipped.len(),
            files_total: stats.files_total,
        }
        .into());
    }

    info!(
        rows = stats.metrics.rows_written,
        duration_secs = stats.duration().as_secs_f64(),
        "Session Merge finished"
    );
    Ok(())
}

/// Apply command-line overrides to the loaded configuration
fn apply_overrides(blueprint: &mut MergeBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding output path from CLI");
        blueprint.output.path = output.clone();
    }
    if let Some(frequency) = args.frequency {
        info!(frequency, "Overriding output frequency from CLI");
        blueprint.output.frequency_hz = Some(frequency);
    }
    if args.streaming {
        info!("Enabling streaming from CLI");
        blueprint.output.streaming = true;
    }

    match (
        args.trigger_channel.clone(),
        args.trigger_threshold,
        blueprint.trigger.as_mut(),
    ) {
        (None, None, _) => {}
        (Some(channel), Some(threshold), _) => {
            blueprint.trigger = Some(TriggerConfig { channel, threshold });
        }
        (Some(channel), None, Some(trigger)) => trigger.channel = channel,
        (None, Some(threshold), Some(trigger)) => trigger.threshold = threshold,
        (Some(_), None, None) | (None, Some(_), None) => {
            return Err(CliError::invalid_override(
                "--trigger-channel and --trigger-threshold must be given together \
                 when the configuration has no [trigger] section",
            ));
        }
    }
    Ok(())
}

/// CSV output, or a log sink for dry runs
fn sink_specs(blueprint: &MergeBlueprint, dry_run: bool) -> Result<Vec<SinkSpec>, CliError> {
    if dry_run {
        info!("Dry run - batches are logged, no file is written");
        return Ok(vec![SinkSpec::Log {
            name: "dry-run".to_string(),
        }]);
    }

    let mut config = CsvSinkConfig::new(&blueprint.output.path)
        .with_delimiter(delimiter_byte(blueprint.output.delimiter)?);
    if blueprint.output.streaming {
        // Appending needs the header up front so every file lands in the same columns
        let selected = blueprint.to_merge_config().selected_channels;
        config = config
            .with_mode(WriteMode::Append)
            .with_header(output_header(&selected));
    }

    Ok(vec![SinkSpec::Csv {
        name: "csv".to_string(),
        config,
    }])
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
