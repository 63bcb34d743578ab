//! Dispatcher - fans merged batches out to every configured sink

use std::sync::Arc;

use contracts::Frame;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{CsvSink, CsvSinkConfig, LogSink};

/// Default per-sink queue capacity (batches)
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Declarative sink description
#[derive(Debug, Clone)]
pub enum SinkSpec {
    /// Delimited-text file
    Csv { name: String, config: CsvSinkConfig },
    /// Batch summaries through tracing
    Log { name: String },
}

impl SinkSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Csv { name, .. } | Self::Log { name } => name,
        }
    }

    fn spawn(self, queue_capacity: usize) -> SinkHandle {
        match self {
            Self::Csv { name, config } => {
                SinkHandle::spawn(CsvSink::new(name, config), queue_capacity)
            }
            Self::Log { name } => SinkHandle::spawn(LogSink::new(name), queue_capacity),
        }
    }
}

/// Fan-out over a set of sink handles
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    batches: u64,
    rows: u64,
}

impl Dispatcher {
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self {
            handles,
            batches: 0,
            rows: 0,
        }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Rows dispatched so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Send one batch to every sink.
    ///
    /// A sink that has stopped is reported but does not stop the others.
    pub async fn dispatch(&mut self, batch: Frame) -> Result<(), DispatcherError> {
        let rows = batch.len();
        let batch = Arc::new(batch);
        let mut first_error = None;

        for handle in &self.handles {
            if let Err(e) = handle.send(Arc::clone(&batch)).await {
                warn!(sink = handle.name(), error = %e, "batch not delivered");
                first_error.get_or_insert(e);
            }
        }

        self.batches += 1;
        self.rows += rows as u64;
        debug!(batch = self.batches, rows, "batch dispatched");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close every sink, returning per-sink metrics or the first sink failure
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) -> Result<Vec<(String, MetricsSnapshot)>, DispatcherError> {
        info!(batches = self.batches, rows = self.rows, "Dispatcher shutting down");

        let mut snapshots = Vec::with_capacity(self.handles.len());
        let mut first_error = None;
        for handle in self.handles {
            let name = handle.name().to_string();
            match handle.shutdown().await {
                Ok(snapshot) => snapshots.push((name, snapshot)),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(snapshots),
        }
    }
}

/// Spawn one worker per sink spec.
///
/// Must be called within a tokio runtime.
#[instrument(name = "dispatcher_create", skip(specs))]
pub fn create_dispatcher(
    specs: Vec<SinkSpec>,
    queue_capacity: usize,
) -> Result<Dispatcher, DispatcherError> {
    if specs.is_empty() {
        return Err(DispatcherError::sink_creation("dispatcher", "no sinks configured"));
    }

    let handles = specs
        .into_iter()
        .map(|spec| {
            debug!(sink = spec.name(), "spawning sink");
            spec.spawn(queue_capacity)
        })
        .collect();
    Ok(Dispatcher::with_handles(handles))
}
