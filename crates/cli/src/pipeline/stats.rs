//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::{RunMetricsAggregator, RunStatus};

/// Statistics from a merge run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Files configured for the run
    pub files_total: usize,

    /// Streaming (per-file) or whole-run merge
    pub streaming: bool,

    /// Per-sink write metrics
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Run metrics aggregator
    pub metrics: RunMetricsAggregator,
}

impl PipelineStats {
    pub fn new(files_total: usize, streaming: bool) -> Self {
        Self {
            files_total,
            streaming,
            ..Default::default()
        }
    }

    pub fn status(&self) -> RunStatus {
        self.metrics.status
    }

    pub fn duration(&self) -> Duration {
        self.metrics.elapsed.unwrap_or_default()
    }

    /// Rows written per second of wall time
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.metrics.rows_written as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        print!("{}", self.metrics.summary());
        println!(
            "Mode: {} ({} files configured)",
            if self.streaming { "streaming" } else { "whole-run" },
            self.files_total
        );
        println!("Throughput: {:.0} rows/s", self.rows_per_second());
        for (name, sink) in &self.sinks {
            println!(
                "Sink '{}': {} rows in {} batches, {} failures",
                name, sink.rows_written, sink.write_count, sink.failure_count
            );
        }
        println!();
    }
}
