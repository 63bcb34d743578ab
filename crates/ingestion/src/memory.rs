//! In-memory source reader
//!
//! Serves prepared tables by file name; used by tests and when embedding the merger.

use std::collections::HashMap;
use std::path::Path;

use contracts::{Column, ContractError, SourceReader, SourceTable};
use tracing::debug;

use crate::columns::prepare_columns;
use crate::csv_reader::file_name;
use crate::error::IngestionError;

/// Reader backed by tables registered in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySourceReader {
    tables: HashMap<String, SourceTable>,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under `name`; columns go through the same preparation as file reads.
    pub fn insert(&mut self, name: impl Into<String>, columns: Vec<Column>) -> &mut Self {
        let name = name.into();
        let (columns, _) = prepare_columns(columns, true);
        self.tables
            .insert(name.clone(), SourceTable::new(name, columns));
        self
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<Column>) -> Self {
        self.insert(name, columns);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl SourceReader for MemorySourceReader {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, path: &Path) -> Result<SourceTable, ContractError> {
        let name = file_name(path);
        let table = self
            .tables
            .get(&name)
            .cloned()
            .ok_or(IngestionError::UnknownTable { file: name })?;
        debug!(file = %table.name, rows = table.row_count(), "memory table read");
        Ok(table)
    }
}
