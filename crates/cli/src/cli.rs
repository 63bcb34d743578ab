//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Session Merge - merge multi-file measurement sessions onto one relative time base
#[derive(Parser, Debug)]
#[command(
    name = "session-merge",
    author,
    version,
    about = "Merge multi-file measurement sessions onto one relative time base",
    long_about = "Merges an ordered list of measurement files into one table.\n\n\
                  Every row gets Time_s / Time_min / Time_h relative to a single run-wide \n\
                  baseline (trigger crossing, pre-scanned first row, or first valid sample), \n\
                  optionally resampled to a fixed frequency."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SESSION_MERGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SESSION_MERGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "SESSION_MERGE_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge the configured files
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Show the channel catalog and pre-scanned baseline of the input files
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "merge.toml",
        env = "SESSION_MERGE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the output file path
    #[arg(short, long, env = "SESSION_MERGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Override the resampling frequency in Hz
    #[arg(long, env = "SESSION_MERGE_FREQUENCY")]
    pub frequency: Option<f64>,

    /// Write each file's rows as soon as it is converted
    #[arg(long, env = "SESSION_MERGE_STREAMING")]
    pub streaming: bool,

    /// Override the trigger channel
    #[arg(long, env = "SESSION_MERGE_TRIGGER_CHANNEL")]
    pub trigger_channel: Option<String>,

    /// Override the trigger threshold
    #[arg(long, env = "SESSION_MERGE_TRIGGER_THRESHOLD", allow_negative_numbers = true)]
    pub trigger_threshold: Option<f64>,

    /// Merge and log batch summaries without writing the output file
    #[arg(long)]
    pub dry_run: bool,

    /// Queue capacity (batches) between the worker and each sink
    #[arg(long, default_value = "8", env = "SESSION_MERGE_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Progress poll interval in milliseconds
    #[arg(long, default_value = "100", env = "SESSION_MERGE_POLL_MS")]
    pub poll_ms: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "merge.toml", env = "SESSION_MERGE_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "merge.toml", env = "SESSION_MERGE_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every channel, not only the selected ones
    #[arg(long)]
    pub all_channels: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
