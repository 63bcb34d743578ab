//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件 → MergeConfig 的完整加载路径
//! - 磁盘 CSV → 读取 → 合并 → CSV 输出的端到端数据流
//! - 流式模式逐文件追加写出

#[cfg(test)]
mod contract_tests {
    use contracts::{output_header, MergeConfig};

    #[test]
    fn test_output_header_order() {
        let config = MergeConfig::new(["P1", "P2"]);
        assert_eq!(
            output_header(&config.selected_channels),
            vec!["Time_s", "Time_min", "Time_h", "P1", "P2", "Source_File"]
        );
    }
}

#[cfg(test)]
mod support {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Write `files` into `dir`, returning their paths in order
    pub fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    /// Column `index` of every data row of a written CSV file
    pub fn column(content: &str, index: usize) -> Vec<String> {
        content
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(index).unwrap_or_default().to_string())
            .collect()
    }

    pub fn header(content: &str) -> Vec<String> {
        content
            .lines()
            .next()
            .unwrap_or_default()
            .split(',')
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use contracts::BaselineSource;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_toml_file_to_merge_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        fs::write(
            &path,
            r#"
            [inputs]
            files = ["a.csv", "b.csv"]

            [channels]
            selected = ["P1"]
            timestamp = "Time"
            tick = "Tick"

            [trigger]
            channel = "Trig"
            threshold = 0.5

            [output]
            path = "merged.csv"
            frequency_hz = 2.0

            [baseline]
            raw_value = 1000.0
            source_kind = "tick"
            "#,
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(&path).unwrap();
        let config = blueprint.to_merge_config();

        assert_eq!(config.selected_channels, vec!["P1"]);
        assert_eq!(config.timestamp_channel.as_deref(), Some("Time"));
        assert_eq!(config.tick_channel.as_deref(), Some("Tick"));
        assert_eq!(config.trigger(), Some(("Trig", 0.5)));
        assert_eq!(config.output_frequency, Some(2.0));
        let candidate = config.baseline_candidate.unwrap();
        assert_eq!(candidate.source_kind, BaselineSource::Tick);

        // Round trip through the serializer keeps the same settings
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed =
            ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap();
        assert_eq!(reparsed.to_merge_config().selected_channels, vec!["P1"]);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merge.toml");
        fs::write(
            &path,
            r#"
            [inputs]
            files = ["a.csv"]

            [channels]
            selected = ["P1"]
            tick = "Tick"

            [output]
            path = "merged.csv"
            frequency_hz = -1.0
            "#,
        )
        .unwrap();

        assert!(ConfigLoader::load_from_path(&path).is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;

    use contracts::{BaselineOrigin, MergeConfig, SourceReader};
    use dispatcher::{create_dispatcher, CsvSinkConfig, SinkSpec};
    use ingestion::{prescan_baseline, ChannelCatalog, CsvSourceReader};
    use observability::{RunMetricsAggregator, RunStatus};
    use tempfile::tempdir;
    use time_engine::MergeEngine;

    use crate::support::{column, header, write_files};

    /// End-to-end test: CSV files -> CsvSourceReader -> MergeEngine -> Dispatcher -> CsvSink
    ///
    /// 验证完整的数据流：
    /// 1. 读取两个源文件 (第三个文件不存在，被跳过)
    /// 2. 触发通道上升沿确定基准
    /// 3. 整体输出一次写入 CSV
    #[tokio::test]
    async fn test_e2e_trigger_merge_to_csv() {
        let dir = tempdir().unwrap();
        let mut files = write_files(
            dir.path(),
            &[
                ("a.csv", "Tick,P1,Trig\n1000,1,0\n1500,2,0\n"),
                ("b.csv", "Tick,P1,Trig\n2000,3,1\n2500,4,1\n"),
            ],
        );
        files.push(dir.path().join("missing.csv"));
        let output = dir.path().join("out").join("merged.csv");

        let config = MergeConfig::new(["P1"])
            .with_tick("Tick")
            .with_trigger("Trig", 0.5);
        let engine = MergeEngine::new(config);
        let reader = CsvSourceReader::with_delimiter(b',');
        let mut aggregator = RunMetricsAggregator::new();

        let mut segments = Vec::new();
        for path in &files {
            match reader.read(path) {
                Ok(table) => {
                    aggregator.on_file_read(&table.name, table.row_count());
                    segments.push(engine.segment(&table));
                }
                Err(e) => {
                    assert_eq!(e.kind(), "source_read");
                    aggregator.on_file_skipped(&ingestion::file_name(path));
                }
            }
        }

        let outcome = engine.merge(segments);
        let baseline = outcome.baseline.unwrap();
        assert_eq!(baseline.origin, BaselineOrigin::Trigger);
        assert_eq!(baseline.absolute_seconds, 2.0);
        assert_eq!(outcome.rows_merged, 4);

        let mut dispatcher = create_dispatcher(
            vec![SinkSpec::Csv {
                name: "csv".to_string(),
                config: CsvSinkConfig::new(&output),
            }],
            4,
        )
        .unwrap();
        aggregator.on_rows_written(outcome.frame.len());
        dispatcher.dispatch(outcome.frame).await.unwrap();
        let sinks = dispatcher.shutdown().await.unwrap();
        assert_eq!(sinks[0].1.rows_written, 4);

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(
            header(&content),
            vec!["Time_s", "Time_min", "Time_h", "P1", "Source_File"]
        );
        assert_eq!(column(&content, 0), vec!["-1", "-0.5", "0", "0.5"]);
        assert_eq!(column(&content, 3), vec!["1", "2", "3", "4"]);
        assert_eq!(column(&content, 4), vec!["a.csv", "a.csv", "b.csv", "b.csv"]);

        aggregator.finish(RunStatus::Completed, std::time::Duration::from_millis(1));
        let summary = aggregator.summary();
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, vec!["missing.csv"]);
        assert_eq!(summary.rows_written, 4);
    }

    /// Pre-scanned candidate as baseline, Config Tree block dropped, resampled to 1 Hz
    #[tokio::test]
    async fn test_e2e_prescan_and_resample() {
        let dir = tempdir().unwrap();
        let files = write_files(
            dir.path(),
            &[
                (
                    "a.csv",
                    "Tick,P1,Config Tree,Setting\n1000,1,x,y\n1500,2,,\n2000,3,,\n",
                ),
                ("b.csv", "Tick,P1\n2500,4\n3000,5\n"),
            ],
        );

        let reader = CsvSourceReader::with_delimiter(b',');
        let catalog = ChannelCatalog::scan(&reader, &files);
        assert_eq!(catalog.names(), vec!["Tick", "P1"]);
        assert_eq!(catalog.common(), vec!["Tick", "P1"]);

        let base = MergeConfig::new(["P1"]).with_tick("Tick").with_frequency(1.0);
        let candidate = prescan_baseline(&reader, &files[0], &base).unwrap().unwrap();
        let engine = MergeEngine::new(base.with_candidate(candidate));

        let segments = files
            .iter()
            .map(|path| engine.segment(&reader.read(path).unwrap()))
            .collect();
        let outcome = engine.merge(segments);

        let baseline = outcome.baseline.unwrap();
        assert_eq!(baseline.origin, BaselineOrigin::PreScanned);
        assert_eq!(baseline.absolute_seconds, 1.0);
        assert_eq!(outcome.rows_merged, 5);

        // Relative 0, 0.5, 1, 1.5, 2 on a 1 s grid keeps rows 0, 2, 4
        let time: Vec<String> = outcome
            .frame
            .column("Time_s")
            .unwrap()
            .values
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(time, vec!["0", "1", "2"]);
        assert!(outcome.warnings.is_empty());
    }
}

#[cfg(test)]
mod streaming_tests {
    use std::fs;

    use contracts::{output_header, MergeConfig, SourceReader};
    use dispatcher::{create_dispatcher, CsvSinkConfig, SinkSpec, WriteMode};
    use ingestion::{prescan_baseline, CsvSourceReader};
    use tempfile::tempdir;
    use time_engine::StreamingMerger;

    use crate::support::{column, header, write_files};

    /// 流式模式：每个文件一批，追加写入同一个 CSV，表头只写一次
    #[tokio::test]
    async fn test_streaming_appends_per_file() {
        let dir = tempdir().unwrap();
        let files = write_files(
            dir.path(),
            &[
                ("a.csv", "Tick,P1\n1000,1\n1500,2\n"),
                ("b.csv", "Tick,P1,P2\n2000,3,9\n2500,4,9\n"),
            ],
        );
        let output = dir.path().join("stream.csv");

        let base = MergeConfig::new(["P1"]).with_tick("Tick").with_streaming(true);
        let reader = CsvSourceReader::with_delimiter(b',');
        let candidate = prescan_baseline(&reader, &files[0], &base).unwrap();
        let config = match candidate {
            Some(c) => base.with_candidate(c),
            None => base,
        };

        let sink_config = CsvSinkConfig::new(&output)
            .with_mode(WriteMode::Append)
            .with_header(output_header(&config.selected_channels));
        let mut dispatcher = create_dispatcher(
            vec![SinkSpec::Csv {
                name: "csv".to_string(),
                config: sink_config,
            }],
            1,
        )
        .unwrap();

        let mut merger = StreamingMerger::new(config);
        for path in &files {
            let table = reader.read(path).unwrap();
            let chunk = merger.process(&table);
            assert!(chunk.warnings.is_empty());
            dispatcher.dispatch(chunk.frame).await.unwrap();
        }
        assert_eq!(merger.baseline().unwrap().absolute_seconds, 1.0);

        let sinks = dispatcher.shutdown().await.unwrap();
        assert_eq!(sinks[0].1.write_count, 2);

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(
            header(&content),
            vec!["Time_s", "Time_min", "Time_h", "P1", "Source_File"]
        );
        assert_eq!(content.matches("Time_s").count(), 1);
        assert_eq!(column(&content, 0), vec!["0", "0.5", "1", "1.5"]);
        assert_eq!(column(&content, 4), vec!["a.csv", "a.csv", "b.csv", "b.csv"]);
    }
}
