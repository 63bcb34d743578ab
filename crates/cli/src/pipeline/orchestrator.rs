//! Pipeline orchestrator - runs the merge on a background worker.
//!
//! The worker reads files in order, checking the cancel token before each one, and
//! reports progress through a bounded queue that the foreground drains on a timer.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use contracts::{BaselineCandidate, MergeBlueprint, MergeConfig, SourceReader, SourceTable};
use dispatcher::Dispatcher;
use ingestion::{file_name, prescan_baseline};
use observability::RunStatus;
use time_engine::{MergeEngine, RunWarnings, StreamingMerger};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

use super::{CancelToken, PipelineStats, RunEvent};
use crate::error::{CliError, Result};

/// Default capacity of the progress queue
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Engine-facing merge configuration
    pub merge: MergeConfig,

    /// Source files in merge order
    pub files: Vec<PathBuf>,

    /// How often the foreground drains progress events
    pub poll_interval: Duration,

    /// Progress queue capacity
    pub event_capacity: usize,
}

impl PipelineConfig {
    pub fn new(merge: MergeConfig, files: Vec<PathBuf>) -> Self {
        Self {
            merge,
            files,
            poll_interval: Duration::from_millis(100),
            event_capacity: EVENT_QUEUE_CAPACITY,
        }
    }

    pub fn from_blueprint(blueprint: &MergeBlueprint) -> Self {
        Self::new(blueprint.to_merge_config(), blueprint.inputs.files.clone())
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// How the file loop ended
enum Flow {
    Finished,
    Cancelled { files_done: usize },
}

/// Main pipeline orchestrator
pub struct Pipeline<R> {
    config: PipelineConfig,
    reader: R,
}

impl<R: SourceReader + 'static> Pipeline<R> {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig, reader: R) -> Self {
        Self { config, reader }
    }

    /// Run the merge on a worker task and render its progress until it ends.
    ///
    /// A cancelled run returns `Ok` with status `Cancelled`; sink and worker failures
    /// return `Err`.
    pub async fn run(self, dispatcher: Dispatcher, cancel: CancelToken) -> Result<PipelineStats> {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_capacity.max(1));
        let poll_interval = self.config.poll_interval;

        let worker = tokio::spawn(async move { self.work(dispatcher, cancel, events_tx).await });
        drive(events_rx, worker, poll_interval).await
    }

    #[instrument(name = "merge_worker", skip_all, fields(files = self.config.files.len()))]
    async fn work(
        self,
        mut dispatcher: Dispatcher,
        cancel: CancelToken,
        events: mpsc::Sender<RunEvent>,
    ) -> Result<PipelineStats> {
        let started = Instant::now();
        let files_total = self.config.files.len();
        let mut config = self.config.merge.clone();
        let mut stats = PipelineStats::new(files_total, config.streaming);

        emit(
            &events,
            RunEvent::Started {
                files: files_total,
                streaming: config.streaming,
            },
        )
        .await;

        if config.baseline_candidate.is_none() {
            config.baseline_candidate = self.prescan(&config, &events).await;
        }

        let flow = if config.streaming {
            self.stream_files(config, &mut dispatcher, &cancel, &events, &mut stats)
                .await
        } else {
            self.merge_files(config, &mut dispatcher, &cancel, &events, &mut stats)
                .await
        };

        // Sinks are closed on every path so appended rows are flushed
        let closed = dispatcher.shutdown().await;
        let outcome = match (flow, closed) {
            (Ok(flow), Ok(sinks)) => {
                stats.sinks = sinks;
                Ok(flow)
            }
            (Err(e), _) | (Ok(_), Err(e)) => Err(CliError::from(e)),
        };

        match outcome {
            Ok(Flow::Finished) => {
                stats.metrics.finish(RunStatus::Completed, started.elapsed());
                emit(
                    &events,
                    RunEvent::Completed {
                        rows_written: stats.metrics.rows_written,
                        baseline: stats.metrics.baseline,
                    },
                )
                .await;
                Ok(stats)
            }
            Ok(Flow::Cancelled { files_done }) => {
                stats.metrics.finish(RunStatus::Cancelled, started.elapsed());
                emit(
                    &events,
                    RunEvent::Cancelled {
                        files_done,
                        files_total,
                    },
                )
                .await;
                Ok(stats)
            }
            Err(e) => {
                stats.metrics.finish(RunStatus::Failed, started.elapsed());
                emit(
                    &events,
                    RunEvent::Failed {
                        message: e.to_string(),
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    /// Capture the first-row candidate of the first file
    async fn prescan(
        &self,
        config: &MergeConfig,
        events: &mpsc::Sender<RunEvent>,
    ) -> Option<BaselineCandidate> {
        let first = self.config.files.first()?;
        match prescan_baseline(&self.reader, first, config) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, "pre-scan failed, baseline falls back to the merged data");
                emit(
                    events,
                    RunEvent::Warning {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    },
                )
                .await;
                None
            }
        }
    }

    /// Streaming: convert and write each file before reading the next
    async fn stream_files(
        &self,
        config: MergeConfig,
        dispatcher: &mut Dispatcher,
        cancel: &CancelToken,
        events: &mpsc::Sender<RunEvent>,
        stats: &mut PipelineStats,
    ) -> std::result::Result<Flow, dispatcher::DispatcherError> {
        let mut merger = StreamingMerger::new(config);

        for (index, path) in self.config.files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(Flow::Cancelled { files_done: index });
            }
            let Some(table) = self.read_file(index, path, events, stats).await else {
                continue;
            };

            let chunk = merger.process(&table);
            report_warnings(chunk.warnings, events, stats).await;
            if stats.metrics.baseline.is_none() {
                if let Some(baseline) = merger.baseline() {
                    stats.metrics.on_baseline(&baseline);
                }
            }

            let rows_written = chunk.frame.len();
            dispatcher.dispatch(chunk.frame).await?;
            stats.metrics.on_rows_written(rows_written);

            emit(
                events,
                RunEvent::FileFinished {
                    file: chunk.source_name,
                    rows_read: table.row_count(),
                    rows_written: Some(rows_written),
                },
            )
            .await;
        }
        Ok(Flow::Finished)
    }

    /// Whole-run: collect every file, then merge and write once
    async fn merge_files(
        &self,
        config: MergeConfig,
        dispatcher: &mut Dispatcher,
        cancel: &CancelToken,
        events: &mpsc::Sender<RunEvent>,
        stats: &mut PipelineStats,
    ) -> std::result::Result<Flow, dispatcher::DispatcherError> {
        let engine = MergeEngine::new(config);
        let mut segments = Vec::with_capacity(self.config.files.len());

        for (index, path) in self.config.files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(Flow::Cancelled { files_done: index });
            }
            let Some(table) = self.read_file(index, path, events, stats).await else {
                continue;
            };

            segments.push(engine.segment(&table));
            emit(
                events,
                RunEvent::FileFinished {
                    file: table.name.clone(),
                    rows_read: table.row_count(),
                    rows_written: None,
                },
            )
            .await;
        }

        if segments.is_empty() {
            warn!("no readable input files, nothing to write");
            emit(
                events,
                RunEvent::Warning {
                    kind: "no_input".to_string(),
                    message: "no readable input files".to_string(),
                },
            )
            .await;
            return Ok(Flow::Finished);
        }

        let outcome = engine.merge(segments);
        report_warnings(outcome.warnings, events, stats).await;
        if let Some(baseline) = outcome.baseline {
            stats.metrics.on_baseline(&baseline);
        }

        let rows_written = outcome.frame.len();
        dispatcher.dispatch(outcome.frame).await?;
        stats.metrics.on_rows_written(rows_written);
        info!(
            rows_merged = outcome.rows_merged,
            rows_written, "merged record handed to sinks"
        );
        Ok(Flow::Finished)
    }

    /// Read one file; a failure skips it and the run continues
    async fn read_file(
        &self,
        index: usize,
        path: &std::path::Path,
        events: &mpsc::Sender<RunEvent>,
        stats: &mut PipelineStats,
    ) -> Option<SourceTable> {
        let file = file_name(path);
        emit(
            events,
            RunEvent::FileStarted {
                index,
                file: file.clone(),
            },
        )
        .await;

        match self.reader.read(path) {
            Ok(table) => {
                stats.metrics.on_file_read(&table.name, table.row_count());
                Some(table)
            }
            Err(e) => {
                warn!(file = %file, error = %e, "skipping unreadable file");
                stats.metrics.on_file_skipped(&file);
                emit(
                    events,
                    RunEvent::FileSkipped {
                        file,
                        reason: e.to_string(),
                    },
                )
                .await;
                None
            }
        }
    }
}

async fn report_warnings(
    warnings: RunWarnings,
    events: &mpsc::Sender<RunEvent>,
    stats: &mut PipelineStats,
) {
    for warning in warnings.into_vec() {
        stats.metrics.on_degradation(warning.kind());
        emit(
            events,
            RunEvent::Warning {
                kind: warning.kind().to_string(),
                message: warning.to_string(),
            },
        )
        .await;
    }
}

/// Queue an event; a foreground that went away is not an error for the worker
async fn emit(events: &mpsc::Sender<RunEvent>, event: RunEvent) {
    let _ = events.send(event).await;
}

/// Drain progress events on a fixed interval until the worker finishes
async fn drive(
    mut events: mpsc::Receiver<RunEvent>,
    mut worker: JoinHandle<Result<PipelineStats>>,
    poll_interval: Duration,
) -> Result<PipelineStats> {
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut finished = false;

    let joined = loop {
        tokio::select! {
            _ = ticker.tick() => finished |= drain(&mut events),
            joined = &mut worker => break joined,
        }
    };
    finished |= drain(&mut events);

    let result = joined.map_err(|e| CliError::worker(e.to_string()))?;
    if !finished {
        warn!("worker ended without a final progress event");
    }
    result
}

fn drain(events: &mut mpsc::Receiver<RunEvent>) -> bool {
    let mut terminal = false;
    while let Ok(event) = events.try_recv() {
        event.render();
        terminal |= event.is_terminal();
    }
    terminal
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BaselineSource, CellValue, Column, ContractError};
    use dispatcher::{MemorySink, SinkHandle};
    use ingestion::MemorySourceReader;

    fn reader() -> MemorySourceReader {
        MemorySourceReader::new()
            .with_table(
                "a.csv",
                vec![
                    Column::from_f64("Tick", &[1000.0, 1500.0, 2000.0]),
                    Column::from_f64("P1", &[1.0, 2.0, 3.0]),
                ],
            )
            .with_table(
                "b.csv",
                vec![
                    Column::from_f64("Tick", &[2500.0, 3000.0]),
                    Column::from_f64("P1", &[4.0, 5.0]),
                ],
            )
    }

    fn config(streaming: bool) -> PipelineConfig {
        PipelineConfig::new(
            MergeConfig::new(["P1"])
                .with_tick("Tick")
                .with_streaming(streaming),
            vec![
                PathBuf::from("a.csv"),
                PathBuf::from("missing.csv"),
                PathBuf::from("b.csv"),
            ],
        )
        .with_poll_interval(Duration::from_millis(5))
    }

    fn memory_dispatcher() -> (Dispatcher, MemorySink) {
        let sink = MemorySink::new("memory");
        let dispatcher = Dispatcher::with_handles(vec![SinkHandle::spawn(sink.clone(), 4)]);
        (dispatcher, sink)
    }

    #[tokio::test]
    async fn test_whole_run_skips_unreadable_file() {
        let (dispatcher, sink) = memory_dispatcher();
        let stats = Pipeline::new(config(false), reader())
            .run(dispatcher, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(stats.status(), RunStatus::Completed);
        assert_eq!(stats.metrics.files_processed, 2);
        assert_eq!(stats.metrics.files_skipped, vec!["missing.csv"]);
        assert_eq!(sink.batches(), 1);

        let frame = sink.frame();
        assert_eq!(
            frame.column("Time_s").unwrap().to_f64(),
            vec![0.0, 0.5, 1.0, 1.5, 2.0]
        );
        assert_eq!(stats.metrics.rows_written, 5);
    }

    #[tokio::test]
    async fn test_streaming_writes_per_file() {
        let (dispatcher, sink) = memory_dispatcher();
        let stats = Pipeline::new(config(true), reader())
            .run(dispatcher, CancelToken::new())
            .await
            .unwrap();

        assert_eq!(stats.status(), RunStatus::Completed);
        assert_eq!(sink.batches(), 2);
        assert_eq!(
            sink.frame().column("Time_s").unwrap().to_f64(),
            vec![0.0, 0.5, 1.0, 1.5, 2.0]
        );
        assert_eq!(stats.sinks[0].1.rows_written, 5);
    }

    #[tokio::test]
    async fn test_cancel_before_start_writes_nothing() {
        let (dispatcher, sink) = memory_dispatcher();
        let cancel = CancelToken::new();
        cancel.cancel();

        let stats = Pipeline::new(config(true), reader())
            .run(dispatcher, cancel)
            .await
            .unwrap();

        assert_eq!(stats.status(), RunStatus::Cancelled);
        assert_eq!(stats.metrics.files_processed, 0);
        assert_eq!(sink.batches(), 0);
        assert!(sink.is_closed());
    }

    /// Reader that raises the cancel flag while the first file is being read
    struct CancellingReader {
        inner: MemorySourceReader,
        cancel: CancelToken,
    }

    impl SourceReader for CancellingReader {
        fn name(&self) -> &str {
            "cancelling"
        }

        fn read(&self, path: &std::path::Path) -> std::result::Result<SourceTable, ContractError> {
            let table = self.inner.read(path)?;
            self.cancel.cancel();
            Ok(table)
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_run_finishes_current_file() {
        let (dispatcher, sink) = memory_dispatcher();
        let cancel = CancelToken::new();
        let reader = CancellingReader {
            inner: reader(),
            cancel: cancel.clone(),
        };
        // a baseline is configured so no pre-scan read raises the flag early
        let mut config = config(true);
        config.merge.baseline_candidate = Some(BaselineCandidate::new(
            CellValue::Number(1000.0),
            BaselineSource::Tick,
        ));

        let stats = Pipeline::new(config, reader)
            .run(dispatcher, cancel)
            .await
            .unwrap();

        assert_eq!(stats.status(), RunStatus::Cancelled);
        assert_eq!(stats.metrics.files_processed, 1);
        assert_eq!(sink.batches(), 1);
        assert_eq!(sink.frame().len(), 3);
    }
}
