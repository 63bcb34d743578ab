//! # Dispatcher
//!
//! 合并结果写出模块。
//!
//! 负责：
//! - 将合并后的 `Frame` 写入 CSV（一次性写出或按文件追加）
//! - 每个 sink 运行在独立任务中，通过有界队列背压，不丢行
//! - Fan-out 到多个 sinks（例如 CSV + 日志摘要）

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, Frame};
pub use dispatcher::{create_dispatcher, Dispatcher, SinkSpec, DEFAULT_QUEUE_CAPACITY};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{CsvSink, CsvSinkConfig, LogSink, MemorySink, WriteMode};
