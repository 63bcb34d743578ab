//! Channel catalog across the files of a run

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::{SourceReader, SourceTable};
use tracing::{debug, warn};

/// One channel seen in at least one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Cleaned channel name
    pub name: String,
    /// Number of files containing the channel
    pub file_count: usize,
    /// File the channel was first seen in
    pub first_seen_in: String,
}

/// Union of channel names across files, first occurrence wins
#[derive(Debug, Clone, Default)]
pub struct ChannelCatalog {
    entries: Vec<ChannelEntry>,
    index: HashMap<String, usize>,
    files: Vec<String>,
    failed: Vec<(PathBuf, String)>,
}

impl ChannelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file and collect its channels; unreadable files are recorded and skipped.
    pub fn scan(reader: &dyn SourceReader, files: &[PathBuf]) -> Self {
        let mut catalog = Self::new();
        for path in files {
            match reader.read(path) {
                Ok(table) => catalog.add_table(&table),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable file in catalog");
                    catalog.failed.push((path.clone(), err.to_string()));
                }
            }
        }
        debug!(
            files = catalog.files.len(),
            channels = catalog.entries.len(),
            failed = catalog.failed.len(),
            "channel catalog built"
        );
        catalog
    }

    /// Add one table's channels
    pub fn add_table(&mut self, table: &SourceTable) {
        for name in table.channel_names() {
            match self.index.get(name) {
                Some(&idx) => self.entries[idx].file_count += 1,
                None => {
                    self.index.insert(name.to_string(), self.entries.len());
                    self.entries.push(ChannelEntry {
                        name: name.to_string(),
                        file_count: 1,
                        first_seen_in: table.name.clone(),
                    });
                }
            }
        }
        self.files.push(table.name.clone());
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    /// Channel names in first-seen order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ChannelEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    /// Names of files read successfully
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Files that could not be read, with the reason
    pub fn failed(&self) -> &[(PathBuf, String)] {
        &self.failed
    }

    /// Channels present in every readable file
    pub fn common(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.file_count == self.files.len())
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySourceReader;
    use contracts::Column;

    fn reader() -> MemorySourceReader {
        MemorySourceReader::new()
            .with_table(
                "a.csv",
                vec![Column::from_f64("Time", &[0.0]), Column::from_f64("P1", &[1.0])],
            )
            .with_table(
                "b.csv",
                vec![Column::from_f64("P2", &[0.0]), Column::from_f64("Time", &[1.0])],
            )
    }

    #[test]
    fn test_union_first_occurrence_wins() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        let catalog = ChannelCatalog::scan(&reader(), &files);

        assert_eq!(catalog.names(), vec!["Time", "P1", "P2"]);
        assert_eq!(catalog.get("Time").unwrap().file_count, 2);
        assert_eq!(catalog.get("P2").unwrap().first_seen_in, "b.csv");
        assert_eq!(catalog.common(), vec!["Time"]);
    }

    #[test]
    fn test_unreadable_files_are_recorded() {
        let files = vec![PathBuf::from("a.csv"), PathBuf::from("missing.csv")];
        let catalog = ChannelCatalog::scan(&reader(), &files);

        assert_eq!(catalog.files(), &["a.csv".to_string()]);
        assert_eq!(catalog.failed().len(), 1);
        assert!(catalog.contains("P1"));
    }
}
