//! # Ingestion
//!
//! Source file reading for the session merger.
//!
//! Responsibilities:
//! - Read per-file channel tables (delimited text, in-memory)
//! - Clean and de-duplicate channel names, drop the trailing "Config Tree" block
//! - Pre-scan the first file for the baseline candidate
//! - Catalog channels across files
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{prescan_baseline, CsvSourceReader};
//! use contracts::SourceReader;
//!
//! let reader = CsvSourceReader::with_delimiter(b',');
//! let candidate = prescan_baseline(&reader, &files[0], &config)?;
//! let table = reader.read(&files[0])?;
//! ```

mod catalog;
mod columns;
mod config;
mod csv_reader;
mod error;
mod memory;
mod prescan;

// Re-exports
pub use catalog::{ChannelCatalog, ChannelEntry};
pub use columns::{prepare_columns, truncate_config_tree, CONFIG_TREE_MARKER};
pub use config::{MetricsSnapshot, ReadMetrics, ReaderOptions};
pub use contracts::{SourceReader, SourceTable};
pub use csv_reader::{file_name, CsvSourceReader};
pub use error::{IngestionError, Result};
pub use memory::MemorySourceReader;
pub use prescan::{candidate_from_table, prescan_baseline};
