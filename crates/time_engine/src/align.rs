//! Segment building and file-order concatenation.

use contracts::{
    CellValue, Column, ContractError, FileSegment, Frame, MergeConfig, SourceTable,
    SOURCE_FILE_COLUMN, TIME_COLUMNS,
};
use tracing::{debug, warn};

use crate::trigger::resolve_channel;

/// Reference and output records of a run, truncated to the same length
#[derive(Debug, Default)]
pub struct AlignedRecord {
    pub reference: Frame,
    pub output: Frame,
    /// Rows contributed by the first file (after truncation)
    pub first_file_rows: usize,
    /// Original lengths when they disagreed
    pub mismatch: Option<ContractError>,
}

impl AlignedRecord {
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

/// Split one source table into its reference frame and output frame.
///
/// Both frames carry the table's row count. The trigger channel is looked up by rank among
/// the table's channels and stored under the configured name. Selected channels absent from
/// the table become missing columns.
pub fn build_segment(table: &SourceTable, config: &MergeConfig) -> FileSegment {
    let rows = table.row_count();

    let mut reference = Vec::new();
    for name in [
        config.timestamp_channel.as_deref(),
        config.tick_channel.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(column) = table.column(name) {
            reference.push(column.clone());
        }
    }

    if let Some(wanted) = config.trigger_channel.as_deref() {
        if let Some(found) = resolve_channel(wanted, &table.channel_names()) {
            if let Some(column) = table.column(&found.name) {
                if !reference.iter().any(|c| c.name == wanted) {
                    reference.push(Column::new(wanted, column.values.clone()));
                }
            }
        }
    }

    let mut reference = Frame::from_columns(reference);
    reference.pad_to(rows);
    let output = output_frame(table, &config.selected_channels, rows);

    debug!(
        file = %table.name,
        reference_rows = reference.len(),
        output_rows = output.len(),
        reference_columns = ?reference.column_names(),
        "segment built"
    );
    FileSegment::new(table.name.clone(), reference, output)
}

/// Time placeholders, selected channels and the source-file column, all of equal length
fn output_frame(table: &SourceTable, selected: &[String], rows: usize) -> Frame {
    let mut columns: Vec<Column> = TIME_COLUMNS
        .iter()
        .map(|name| Column::nulls(*name, rows))
        .collect();

    for name in selected {
        let column = match table.column(name) {
            Some(column) => column.clone(),
            None => Column::nulls(name.as_str(), rows),
        };
        columns.push(column);
    }

    columns.push(Column::new(
        SOURCE_FILE_COLUMN,
        vec![CellValue::Text(table.name.clone()); rows],
    ));

    Frame::from_columns(columns)
}

/// Concatenate segments in file order; unequal totals are truncated to the shorter length
/// and reported once.
pub fn align_segments(segments: Vec<FileSegment>) -> AlignedRecord {
    let first_file_rows = segments
        .first()
        .map(|s| s.reference.len())
        .unwrap_or(0);

    let mut reference = Frame::new();
    let mut output = Frame::new();
    for segment in segments {
        reference.append(segment.reference);
        output.append(segment.output);
    }

    let mismatch = reconcile(&mut reference, &mut output);
    let first_file_rows = first_file_rows.min(reference.len());

    AlignedRecord {
        reference,
        output,
        first_file_rows,
        mismatch,
    }
}

/// Truncate both frames to the shorter length, keeping the leading rows
pub fn reconcile(reference: &mut Frame, output: &mut Frame) -> Option<ContractError> {
    let (ref_len, out_len) = (reference.len(), output.len());
    if ref_len == out_len {
        return None;
    }

    let keep = ref_len.min(out_len);
    reference.truncate(keep);
    output.truncate(keep);

    warn!(
        reference = ref_len,
        output = out_len,
        kept = keep,
        "reference/output length mismatch, truncated to shorter"
    );
    metrics::counter!("merge_alignment_mismatch_total").increment(1);

    Some(ContractError::AlignmentLengthMismatch {
        reference: ref_len,
        output: out_len,
    })
}
