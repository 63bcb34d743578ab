//! CsvSink - writes merged rows as delimited text

use std::fs::File;
use std::path::{Path, PathBuf};

use contracts::{Column, ContractError, DataSink, Frame};
use csv::{Writer, WriterBuilder};
use tracing::{debug, info, instrument};

/// How successive writes land in the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// The whole table arrives in a single write
    #[default]
    OneShot,
    /// One write per source file; the header is emitted once
    Append,
}

/// CsvSink configuration
#[derive(Debug, Clone)]
pub struct CsvSinkConfig {
    /// Output file path
    pub path: PathBuf,
    /// Field delimiter
    pub delimiter: u8,
    /// Write mode
    pub mode: WriteMode,
    /// Column order; taken from the first batch when `None`
    pub header: Option<Vec<String>>,
}

impl CsvSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            mode: WriteMode::OneShot,
            header: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = Some(header);
        self
    }
}

/// Sink that writes batches to a delimited-text file.
///
/// Columns are written in header order. A header column absent from a batch is written
/// as empty cells, batch columns outside the header are ignored.
pub struct CsvSink {
    name: String,
    config: CsvSinkConfig,
    writer: Option<Writer<File>>,
    header: Option<Vec<String>>,
    batches: u64,
    rows_written: u64,
}

impl CsvSink {
    pub fn new(name: impl Into<String>, config: CsvSinkConfig) -> Self {
        let header = config.header.clone();
        Self {
            name: name.into(),
            config,
            writer: None,
            header,
            batches: 0,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn open(&mut self, header: &[String]) -> Result<(), ContractError> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.config.path)?;
        let mut writer = WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(header)
            .map_err(|e| self.write_error(e))?;

        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            columns = header.len(),
            "output file created"
        );
        self.writer = Some(writer);
        Ok(())
    }

    fn write_rows(&mut self, header: &[String], batch: &Frame) -> Result<(), ContractError> {
        let columns: Vec<Option<&Column>> = header.iter().map(|h| batch.column(h)).collect();
        let Some(writer) = self.writer.as_mut() else {
            return Err(ContractError::sink_write(&self.name, "writer not open"));
        };

        let mut record: Vec<String> = Vec::with_capacity(header.len());
        for row in 0..batch.len() {
            record.clear();
            record.extend(columns.iter().map(|column| {
                column
                    .and_then(|c| c.values.get(row))
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            }));
            if let Err(e) = writer.write_record(&record) {
                return Err(ContractError::sink_write(&self.name, e.to_string()));
            }
        }
        self.rows_written += batch.len() as u64;
        Ok(())
    }

    fn write_error(&self, err: csv::Error) -> ContractError {
        ContractError::sink_write(&self.name, err.to_string())
    }
}

impl DataSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        skip(self, batch),
        fields(sink = %self.name, rows = batch.len())
    )]
    async fn write(&mut self, batch: &Frame) -> Result<(), ContractError> {
        if self.config.mode == WriteMode::OneShot && self.batches > 0 {
            return Err(ContractError::sink_write(
                &self.name,
                "one-shot sink accepts a single write",
            ));
        }

        let header = match &self.header {
            Some(header) => header.clone(),
            None => {
                let header: Vec<String> =
                    batch.column_names().into_iter().map(String::from).collect();
                self.header = Some(header.clone());
                header
            }
        };

        if self.writer.is_none() {
            self.open(&header)?;
        }
        self.write_rows(&header, batch)?;
        self.batches += 1;

        if self.config.mode == WriteMode::OneShot {
            self.flush().await?;
        }
        Ok(())
    }

    #[instrument(name = "csv_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    #[instrument(name = "csv_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        // A run with no batches still leaves a header-only file when the header is known
        if self.writer.is_none() {
            if let Some(header) = self.header.clone() {
                self.open(&header)?;
            }
        }
        self.flush().await?;
        self.writer = None;
        info!(
            sink = %self.name,
            path = %self.config.path.display(),
            rows = self.rows_written,
            batches = self.batches,
            "CsvSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CellValue;
    use tempfile::tempdir;

    fn batch(times: &[f64], p1: &[f64], source: &str) -> Frame {
        let mut frame = Frame::from_columns(vec![
            Column::from_f64("Time_s", times),
            Column::from_f64("P1", p1),
        ]);
        frame.set_column(
            "Source_File",
            vec![CellValue::Text(source.to_string()); times.len()],
        );
        frame
    }

    #[tokio::test]
    async fn test_one_shot_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        let mut sink = CsvSink::new("csv", CsvSinkConfig::new(&path));

        sink.write(&batch(&[0.0, 0.5], &[1.0, 2.0], "a.csv"))
            .await
            .unwrap();
        sink.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Time_s,P1,Source_File\n0,1,a.csv\n0.5,2,a.csv\n");
    }

    #[tokio::test]
    async fn test_one_shot_rejects_second_write() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new("csv", CsvSinkConfig::new(dir.path().join("out.csv")));

        sink.write(&batch(&[0.0], &[1.0], "a.csv")).await.unwrap();
        let err = sink.write(&batch(&[1.0], &[2.0], "b.csv")).await.unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }

    #[tokio::test]
    async fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        let config = CsvSinkConfig::new(&path)
            .with_mode(WriteMode::Append)
            .with_delimiter(b';');
        let mut sink = CsvSink::new("csv", config);

        sink.write(&batch(&[0.0], &[1.0], "a.csv")).await.unwrap();
        sink.write(&batch(&[1.0, 2.0], &[2.0, 3.0], "b.csv"))
            .await
            .unwrap();
        sink.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Time_s;P1;Source_File",
                "0;1;a.csv",
                "1;2;b.csv",
                "2;3;b.csv"
            ]
        );
        assert_eq!(sink.rows_written(), 3);
    }

    #[tokio::test]
    async fn test_fixed_header_fills_missing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        let header = vec!["Time_s".to_string(), "P2".to_string(), "P1".to_string()];
        let mut sink = CsvSink::new("csv", CsvSinkConfig::new(&path).with_header(header));

        let mut frame = batch(&[0.0], &[7.0], "a.csv");
        frame.set_column("Time_s", vec![CellValue::Null]);
        sink.write(&frame).await.unwrap();
        sink.close().await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Time_s,P2,P1\n,,7\n");
    }

    #[tokio::test]
    async fn test_close_without_rows_leaves_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("merged.csv");
        let config = CsvSinkConfig::new(&path)
            .with_mode(WriteMode::Append)
            .with_header(vec!["Time_s".to_string(), "Source_File".to_string()]);
        let mut sink = CsvSink::new("csv", config);

        sink.close().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Time_s,Source_File\n"
        );
    }
}
