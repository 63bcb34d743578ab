//! Delimited-text source reader

use std::path::Path;
use std::sync::Arc;

use contracts::{CellValue, Column, ContractError, SourceReader, SourceTable};
use csv::{ReaderBuilder, Trim};
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::columns::prepare_columns;
use crate::config::{ReadMetrics, ReaderOptions};
use crate::error::{IngestionError, Result};

/// Reads one delimited-text file per source.
///
/// The header row names the channels. Rows may be ragged: a row shorter than the header
/// simply ends those channels early, so channels can differ in length.
pub struct CsvSourceReader {
    options: ReaderOptions,
    metrics: Arc<ReadMetrics>,
}

impl CsvSourceReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self {
            options,
            metrics: Arc::new(ReadMetrics::new()),
        }
    }

    /// Reader for the given delimiter with default options
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self::new(ReaderOptions::with_delimiter(delimiter))
    }

    /// Shared read metrics
    pub fn metrics(&self) -> Arc<ReadMetrics> {
        self.metrics.clone()
    }

    /// Read and prepare one file
    #[instrument(name = "csv_read", skip(self), fields(path = %path.display()))]
    pub fn read_table(&self, path: &Path) -> Result<SourceTable> {
        let file_name = file_name(path);
        match self.read_inner(path, &file_name) {
            Ok(table) => {
                self.metrics.record_file(table.row_count());
                counter!("ingestion_files_read_total").increment(1);
                counter!("ingestion_rows_read_total").increment(table.row_count() as u64);
                Ok(table)
            }
            Err(err) => {
                self.metrics.record_failure();
                counter!("ingestion_files_failed_total").increment(1);
                warn!(file = %file_name, error = %err, "failed to read source file");
                Err(err)
            }
        }
    }

    fn read_inner(&self, path: &Path, file_name: &str) -> Result<SourceTable> {
        let file = std::fs::File::open(path).map_err(|source| IngestionError::Io {
            file: file_name.to_string(),
            source,
        })?;

        let mut csv = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(file);

        let parse_err = |e: csv::Error| IngestionError::ParseFailed {
            file: file_name.to_string(),
            message: e.to_string(),
        };

        let headers = csv.headers().map_err(parse_err)?.clone();
        if headers.is_empty() {
            return Err(IngestionError::NoChannels {
                file: file_name.to_string(),
            });
        }

        let mut columns: Vec<Column> = headers
            .iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for record in csv.records() {
            let record = record.map_err(parse_err)?;
            for (column, field) in columns.iter_mut().zip(record.iter()) {
                column.values.push(CellValue::infer(field));
            }
        }

        let (columns, dropped) = prepare_columns(columns, self.options.truncate_config_tree);
        if dropped > 0 {
            self.metrics.record_dropped(dropped);
        }
        if columns.is_empty() {
            return Err(IngestionError::NoChannels {
                file: file_name.to_string(),
            });
        }

        let table = SourceTable::new(file_name, columns);
        debug!(
            file = %table.name,
            channels = table.columns.len(),
            rows = table.row_count(),
            dropped,
            "source file read"
        );
        Ok(table)
    }
}

impl Default for CsvSourceReader {
    fn default() -> Self {
        Self::new(ReaderOptions::default())
    }
}

impl SourceReader for CsvSourceReader {
    fn name(&self) -> &str {
        "csv"
    }

    fn read(&self, path: &Path) -> std::result::Result<SourceTable, ContractError> {
        Ok(self.read_table(path)?)
    }
}

/// File name without directories, falling back to the full path
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_infers_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "run_01.csv",
            "Time,Tick,P1,Note\n2024-03-01 12:00:00,1000,1.5,ok\n2024-03-01 12:00:01,2000,,late\n",
        );

        let table = CsvSourceReader::default().read_table(&path).unwrap();
        assert_eq!(table.name, "run_01.csv");
        assert_eq!(table.channel_names(), vec!["Time", "Tick", "P1", "Note"]);
        assert!(matches!(
            table.column("Time").unwrap().values[0],
            CellValue::DateTime(_)
        ));
        assert_eq!(table.column("Tick").unwrap().to_f64(), vec![1000.0, 2000.0]);
        assert!(table.column("P1").unwrap().values[1].is_null());
        assert_eq!(
            table.column("Note").unwrap().values[1],
            CellValue::Text("late".into())
        );
    }

    #[test]
    fn test_ragged_rows_give_unequal_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "ragged.csv", "Tick,P1\n1,10\n2,20\n3\n");

        let table = CsvSourceReader::default().read_table(&path).unwrap();
        assert_eq!(table.column("Tick").unwrap().len(), 3);
        assert_eq!(table.column("P1").unwrap().len(), 2);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_cleans_names_and_drops_config_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "tree.csv",
            "\"'Time'\",Group\\P1,P1,Config Tree,Extra\n0,1,2,x,y\n",
        );

        let reader = CsvSourceReader::default();
        let table = reader.read_table(&path).unwrap();
        assert_eq!(table.channel_names(), vec!["Time", "Group/P1", "P1"]);
        assert_eq!(reader.metrics().snapshot().channels_dropped, 2);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "semi.csv", "Tick;P1\n1;2\n");

        let table = CsvSourceReader::with_delimiter(b';')
            .read_table(&path)
            .unwrap();
        assert_eq!(table.column("P1").unwrap().to_f64(), vec![2.0]);
    }

    #[test]
    fn test_missing_file_is_source_read_error() {
        let reader = CsvSourceReader::default();
        let err = reader.read(Path::new("/nonexistent/run.csv")).unwrap_err();
        assert!(matches!(err, ContractError::SourceRead { ref file, .. } if file == "run.csv"));
        assert_eq!(reader.metrics().snapshot().files_failed, 1);
    }
}
