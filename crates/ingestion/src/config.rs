//! Reader options and read metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Reader options
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Drop the trailing "Config Tree" metadata block
    pub truncate_config_tree: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            truncate_config_tree: true,
        }
    }
}

impl ReaderOptions {
    /// Create options with the given delimiter
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            ..Default::default()
        }
    }
}

/// Read metrics
#[derive(Debug, Default)]
pub struct ReadMetrics {
    /// Files read successfully
    pub files_read: AtomicU64,

    /// Files that failed to read
    pub files_failed: AtomicU64,

    /// Data rows read
    pub rows_read: AtomicU64,

    /// Channels dropped (duplicates and Config Tree block)
    pub channels_dropped: AtomicU64,
}

impl ReadMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully read file
    pub fn record_file(&self, rows: usize) {
        self.files_read.fetch_add(1, Ordering::Relaxed);
        self.rows_read.fetch_add(rows as u64, Ordering::Relaxed);
    }

    /// Record a failed read
    pub fn record_failure(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record dropped channels
    pub fn record_dropped(&self, count: usize) {
        self.channels_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_read: self.files_read.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            rows_read: self.rows_read.load(Ordering::Relaxed),
            channels_dropped: self.channels_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub files_read: u64,
    pub files_failed: u64,
    pub rows_read: u64,
    pub channels_dropped: u64,
}
