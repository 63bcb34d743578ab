//! # Session Merge CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、覆盖与验证
//! - 后台合并任务编排（取消令牌 + 进度队列）
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging (and metrics exporter) based on CLI options
    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet)
        .with_metrics_port(cli.metrics_port),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Session Merge CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
