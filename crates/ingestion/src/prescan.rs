//! Baseline pre-scan
//!
//! Runs before the conversion run and captures the zero-reference from the first row of
//! the first file. The result is plain data handed to the merge engine.

use std::path::Path;

use contracts::{
    BaselineCandidate, BaselineSource, CellValue, ContractError, MergeConfig, SourceReader,
    SourceTable,
};
use tracing::{info, instrument, warn};

/// Read the first file and capture its first-row baseline candidate.
///
/// Returns `Ok(None)` when neither configured time channel has a usable first-row value.
#[instrument(name = "prescan_baseline", skip(reader, config), fields(path = %first_file.display()))]
pub fn prescan_baseline(
    reader: &dyn SourceReader,
    first_file: &Path,
    config: &MergeConfig,
) -> Result<Option<BaselineCandidate>, ContractError> {
    let table = reader.read(first_file)?;
    let candidate = candidate_from_table(&table, config);

    match &candidate {
        Some(c) => info!(
            file = %table.name,
            source_kind = ?c.source_kind,
            raw_value = %c.raw_value,
            "captured baseline candidate"
        ),
        None => warn!(
            file = %table.name,
            timestamp = ?config.timestamp_channel,
            tick = ?config.tick_channel,
            "no baseline candidate in first row"
        ),
    }

    Ok(candidate)
}

/// First-row candidate of an already-read table: timestamp channel preferred, tick otherwise.
pub fn candidate_from_table(table: &SourceTable, config: &MergeConfig) -> Option<BaselineCandidate> {
    let sources = [
        (config.timestamp_channel.as_deref(), BaselineSource::Timestamp),
        (config.tick_channel.as_deref(), BaselineSource::Tick),
    ];

    sources.into_iter().find_map(|(channel, kind)| {
        let value = first_row_value(table, channel?)?;
        Some(BaselineCandidate::new(value, kind))
    })
}

fn first_row_value(table: &SourceTable, channel: &str) -> Option<CellValue> {
    table
        .column(channel)?
        .values
        .first()
        .filter(|v| !v.is_null())
        .cloned()
}
