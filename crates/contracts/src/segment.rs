//! FileSegment - one source file's contribution to a run

use crate::Frame;

/// Relative time in seconds (first output column)
pub const TIME_SECONDS_COLUMN: &str = "Time_s";
/// Relative time in minutes
pub const TIME_MINUTES_COLUMN: &str = "Time_min";
/// Relative time in hours
pub const TIME_HOURS_COLUMN: &str = "Time_h";
/// Source file name (last output column)
pub const SOURCE_FILE_COLUMN: &str = "Source_File";

/// Leading reserved time placeholders, in output order
pub const TIME_COLUMNS: [&str; 3] = [TIME_SECONDS_COLUMN, TIME_MINUTES_COLUMN, TIME_HOURS_COLUMN];

/// Fixed output column order: time placeholders, selected channels, source file
pub fn output_header(selected_channels: &[String]) -> Vec<String> {
    TIME_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(selected_channels.iter().cloned())
        .chain(std::iter::once(SOURCE_FILE_COLUMN.to_string()))
        .collect()
}

/// One file's reference frame (time-bearing channels) and output frame
/// (selected channels plus reserved columns)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSegment {
    /// Source file name
    pub source_name: String,
    /// Timestamp / tick / trigger channels present in this file
    pub reference: Frame,
    /// Time placeholders, selected channels, source-file column
    pub output: Frame,
}

impl FileSegment {
    pub fn new(source_name: impl Into<String>, reference: Frame, output: Frame) -> Self {
        Self {
            source_name: source_name.into(),
            reference,
            output,
        }
    }
}
