//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, DataSink, Frame, SOURCE_FILE_COLUMN, TIME_SECONDS_COLUMN};
use tracing::{info, instrument};

/// Sink that logs batch summaries; used for dry runs
pub struct LogSink {
    name: String,
    batches: u64,
    rows: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            rows: 0,
        }
    }

    fn log_batch_summary(&self, batch: &Frame) {
        let time = batch.column(TIME_SECONDS_COLUMN).map(|c| c.to_f64());
        let first_time = time
            .as_ref()
            .and_then(|t| t.iter().copied().find(|v| !v.is_nan()));
        let last_time = time
            .as_ref()
            .and_then(|t| t.iter().rev().copied().find(|v| !v.is_nan()));
        let source = batch
            .column(SOURCE_FILE_COLUMN)
            .and_then(|c| c.values.first())
            .map(|v| v.to_string())
            .unwrap_or_default();

        info!(
            sink = %self.name,
            batch = self.batches,
            rows = batch.len(),
            columns = batch.width(),
            source = %source,
            first_time_s = ?first_time,
            last_time_s = ?last_time,
            "batch received"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, rows = batch.len())
    )]
    async fn write(&mut self, batch: &Frame) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        self.batches += 1;
        self.rows += batch.len() as u64;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            rows = self.rows,
            "LogSink closed"
        );
        Ok(())
    }
}
