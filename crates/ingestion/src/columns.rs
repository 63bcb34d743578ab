//! Column preparation shared by every reader: name cleaning, de-duplication and
//! the trailing "Config Tree" cut.

use std::collections::HashSet;

use contracts::{clean_channel_name, Column};
use tracing::debug;

/// Marker of the trailing metadata block
pub const CONFIG_TREE_MARKER: &str = "Config Tree";

/// Drop the first column whose name contains `Config Tree` and every column after it.
///
/// Returns the number of columns dropped.
pub fn truncate_config_tree(columns: &mut Vec<Column>) -> usize {
    match columns
        .iter()
        .position(|c| c.name.contains(CONFIG_TREE_MARKER))
    {
        Some(cut) => {
            let dropped = columns.len() - cut;
            debug!(
                column = %columns[cut].name,
                dropped,
                "truncating trailing Config Tree block"
            );
            columns.truncate(cut);
            dropped
        }
        None => 0,
    }
}

/// Clean names, optionally cut the Config Tree block, keep the first occurrence of each name.
///
/// Returns the prepared columns and the number of columns dropped.
pub fn prepare_columns(raw: Vec<Column>, truncate_tree: bool) -> (Vec<Column>, usize) {
    let mut columns: Vec<Column> = raw
        .into_iter()
        .map(|mut c| {
            c.name = clean_channel_name(&c.name);
            c
        })
        .collect();

    let mut dropped = if truncate_tree {
        truncate_config_tree(&mut columns)
    } else {
        0
    };

    let mut seen = HashSet::new();
    let before = columns.len();
    columns.retain(|c| !c.name.is_empty() && seen.insert(c.name.clone()));
    dropped += before - columns.len();

    (columns, dropped)
}
