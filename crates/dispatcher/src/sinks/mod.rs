//! Sink implementations
//!
//! Contains CsvSink, LogSink, and MemorySink.

mod csv_file;
mod log;
mod memory;

pub use self::csv_file::{CsvSink, CsvSinkConfig, WriteMode};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
