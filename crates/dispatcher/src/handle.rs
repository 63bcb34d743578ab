//! SinkHandle - runs a sink on its own task behind a bounded queue

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use contracts::{DataSink, Frame};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Handle to a running sink worker.
///
/// `send` waits for queue space instead of dropping, so every merged row reaches the sink.
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send batches to worker
    tx: mpsc::Sender<Arc<Frame>>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Last write error reported by the worker
    last_error: Arc<Mutex<Option<String>>>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());
        let last_error = Arc::new(Mutex::new(None));

        let worker = SinkWorker {
            name: name.clone(),
            metrics: Arc::clone(&metrics),
            last_error: Arc::clone(&last_error),
        };
        let worker_handle = tokio::spawn(async move {
            worker.run(sink, rx).await;
        });

        Self {
            name,
            tx,
            metrics,
            last_error,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch, waiting while the queue is full
    pub async fn send(&self, batch: Arc<Frame>) -> Result<(), DispatcherError> {
        self.tx
            .send(batch)
            .await
            .map_err(|_| DispatcherError::SinkClosed {
                sink_name: self.name.clone(),
            })?;
        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
        Ok(())
    }

    /// Drain the queue, flush and close the sink.
    ///
    /// Fails when any write failed during the sink's lifetime.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) -> Result<MetricsSnapshot, DispatcherError> {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
            return Err(DispatcherError::SinkClosed {
                sink_name: self.name,
            });
        }

        let snapshot = self.metrics.snapshot();
        debug!(sink = %self.name, ?snapshot, "SinkHandle shutdown complete");

        if snapshot.failure_count > 0 {
            let last_error = match self.last_error.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            return Err(DispatcherError::WriteFailed {
                sink_name: self.name,
                failures: snapshot.failure_count,
                last_error: last_error.unwrap_or_default(),
            });
        }
        Ok(snapshot)
    }
}

/// State shared between a handle and its worker task
struct SinkWorker {
    name: String,
    metrics: Arc<SinkMetrics>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl SinkWorker {
    #[instrument(name = "sink_worker_loop", skip_all, fields(sink = %self.name))]
    async fn run<S: DataSink>(self, mut sink: S, mut rx: mpsc::Receiver<Arc<Frame>>) {
        debug!(sink = %self.name, "Sink worker started");

        while let Some(batch) = rx.recv().await {
            self.metrics.set_queue_len(rx.len());

            match sink.write(&batch).await {
                Ok(()) => {
                    self.metrics.record_write(batch.len());
                    metrics::counter!("sink_rows_written_total", "sink" => self.name.clone())
                        .increment(batch.len() as u64);
                }
                Err(e) => self.fail("Write failed", e.to_string()),
            }
        }

        if let Err(e) = sink.flush().await {
            self.fail("Flush failed on shutdown", e.to_string());
        }
        if let Err(e) = sink.close().await {
            self.fail("Close failed on shutdown", e.to_string());
        }

        debug!(sink = %self.name, "Sink worker stopped");
    }

    fn fail(&self, what: &str, message: String) {
        self.metrics.inc_failure_count();
        metrics::counter!("sink_failures_total", "sink" => self.name.clone()).increment(1);
        error!(sink = %self.name, error = %message, "{what}");
        if let Ok(mut guard) = self.last_error.lock() {
            *guard = Some(message);
        }
    }
}
