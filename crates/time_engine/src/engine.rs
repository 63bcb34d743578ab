//! Whole-run and streaming merge drivers.

use contracts::{
    BaselineSource, ContractError, FileSegment, Frame, MergeConfig, ResolvedBaseline,
    SourceTable,
};
use metrics::counter;
use tracing::{info, instrument, warn};

use crate::align::{align_segments, build_segment, reconcile, AlignedRecord};
use crate::baseline::{resolve_file_baseline, resolve_with_axis, BaselineInputs, TimeAxis};
use crate::relative::{derive_relative, fill_time_columns};
use crate::resample::{select_nearest, select_on_grid};
use crate::trigger::{locate_trigger, TriggerHit};
use crate::unit::{detect_units, tick_seconds};

/// Degraded conditions collected during a run
#[derive(Debug, Default)]
pub struct RunWarnings {
    items: Vec<ContractError>,
}

impl RunWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a degraded condition
    pub fn push(&mut self, warning: ContractError) {
        counter!("merge_degraded_total", "kind" => warning.kind()).increment(1);
        self.items.push(warning);
    }

    pub fn extend(&mut self, other: RunWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractError> {
        self.items.iter()
    }

    /// Number of warnings of the given kind
    pub fn count_kind(&self, kind: &str) -> usize {
        self.items.iter().filter(|w| w.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<ContractError> {
        self.items
    }
}

/// Result of a whole-run merge
#[derive(Debug)]
pub struct MergeOutcome {
    /// Output rows: time columns, selected channels, source file
    pub frame: Frame,
    pub baseline: Option<ResolvedBaseline>,
    pub trigger: Option<TriggerHit>,
    /// Rows in the combined record before resampling
    pub rows_merged: usize,
    pub warnings: RunWarnings,
}

/// Every usable time axis in preference order: timestamp channel if it parses, then tick.
///
/// A channel that fails to parse is reported only when no axis is left.
pub fn time_axes(reference: &Frame, config: &MergeConfig, warnings: &mut RunWarnings) -> Vec<TimeAxis> {
    let sources = [
        (config.timestamp_channel.as_deref(), BaselineSource::Timestamp),
        (config.tick_channel.as_deref(), BaselineSource::Tick),
    ];

    let mut axes = Vec::new();
    let mut failures = Vec::new();
    for (name, source) in sources {
        let Some(column) = name.and_then(|name| reference.column(name)) else {
            continue;
        };
        let parsed = match source {
            BaselineSource::Timestamp => detect_units(column),
            BaselineSource::Tick => tick_seconds(column),
        };
        match parsed {
            Ok(seconds) => axes.push(TimeAxis::new(seconds, source, column.name.as_str())),
            Err(err) => {
                warn!(column = %column.name, source = ?source, error = %err, "time channel unusable");
                failures.push(err);
            }
        }
    }

    // A tick failure behind a working timestamp axis is not a degradation
    if axes.first().map_or(true, |a| a.source == BaselineSource::Tick) {
        for err in failures {
            warnings.push(err);
        }
    }
    axes
}

/// The preferred time axis: timestamp channel if it parses, tick channel otherwise
pub fn time_axis(reference: &Frame, config: &MergeConfig, warnings: &mut RunWarnings) -> Option<TimeAxis> {
    time_axes(reference, config, warnings).into_iter().next()
}

/// Whole-run merger: holds the combined record of every file.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    config: MergeConfig,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Split one source table into its segment
    pub fn segment(&self, table: &SourceTable) -> FileSegment {
        build_segment(table, &self.config)
    }

    /// Merge segments given in file order.
    ///
    /// Align, locate the trigger, resolve the baseline, fill relative time, then resample.
    #[instrument(name = "merge_run", skip(self, segments), fields(files = segments.len()))]
    pub fn merge(&self, segments: Vec<FileSegment>) -> MergeOutcome {
        let mut warnings = RunWarnings::new();

        let AlignedRecord {
            reference,
            mut output,
            first_file_rows,
            mismatch,
        } = align_segments(segments);
        if let Some(mismatch) = mismatch {
            warnings.push(mismatch);
        }
        let rows_merged = output.len();

        let axes = time_axes(&reference, &self.config, &mut warnings);
        let trigger = self.find_trigger(&reference);

        // The axis that supplied the baseline also supplies every row's relative time
        let resolved = match resolve_with_axis(BaselineInputs {
            trigger_index: trigger.map(|t| t.index),
            candidate: self.config.baseline_candidate.as_ref(),
            axes: &axes,
            first_file_rows,
        }) {
            Ok((baseline, axis)) => Some((baseline, axis)),
            Err(err) => {
                warn!(error = %err, "baseline unresolved, time columns stay empty");
                warnings.push(err);
                None
            }
        };
        let baseline = resolved.map(|(baseline, _)| baseline);

        let relative = match resolved {
            Some((baseline, axis)) => {
                let relative = derive_relative(&axis.seconds, &baseline);
                fill_time_columns(&mut output, &relative);
                Some(relative)
            }
            None => None,
        };

        if let Some(frequency) = self.config.output_frequency {
            output = match relative.as_deref() {
                Some(relative) => match select_nearest(relative, frequency) {
                    Ok(indices) => {
                        info!(
                            frequency,
                            before = output.len(),
                            after = indices.len(),
                            "resampled"
                        );
                        output.take_rows(&indices)
                    }
                    Err(err) => {
                        warn!(error = %err, "resampling skipped, keeping all rows");
                        warnings.push(err);
                        output
                    }
                },
                None => {
                    let err = ContractError::downsample_skipped("no relative time axis");
                    warn!(error = %err, "resampling skipped, keeping all rows");
                    warnings.push(err);
                    output
                }
            };
        }

        counter!("merge_rows_merged_total").increment(rows_merged as u64);
        info!(
            rows_merged,
            rows_out = output.len(),
            baseline = ?baseline.map(|b| b.absolute_seconds),
            origin = ?baseline.map(|b| b.origin),
            warnings = warnings.len(),
            "merge complete"
        );

        MergeOutcome {
            frame: output,
            baseline,
            trigger,
            rows_merged,
            warnings,
        }
    }

    fn find_trigger(&self, reference: &Frame) -> Option<TriggerHit> {
        let (channel, threshold) = self.config.trigger()?;
        let Some(column) = reference.column(channel) else {
            warn!(channel, "trigger channel not found in any file");
            return None;
        };

        let hit = locate_trigger(&column.to_f64(), threshold);
        match hit {
            Some(hit) => info!(channel, threshold, index = hit.index, kind = ?hit.kind, "trigger located"),
            None => warn!(channel, threshold, "no trigger crossing, falling back"),
        }
        hit
    }
}

/// Rows produced for one file in streaming mode
#[derive(Debug)]
pub struct StreamChunk {
    pub source_name: String,
    pub frame: Frame,
    pub warnings: RunWarnings,
}

/// Per-file merger: resolves the baseline on the first file and reuses it.
///
/// The trigger and the whole-run first-row fallback need the entire record and are not
/// available here.
#[derive(Debug)]
pub struct StreamingMerger {
    config: MergeConfig,
    baseline: Option<ResolvedBaseline>,
    axis_source: Option<BaselineSource>,
    grid_origin: Option<f64>,
    files_seen: usize,
}

impl StreamingMerger {
    pub fn new(config: MergeConfig) -> Self {
        if config.trigger().is_some() {
            warn!("trigger is ignored in streaming mode");
        }
        Self {
            config,
            baseline: None,
            axis_source: None,
            grid_origin: None,
            files_seen: 0,
        }
    }

    pub fn baseline(&self) -> Option<ResolvedBaseline> {
        self.baseline
    }

    pub fn files_seen(&self) -> usize {
        self.files_seen
    }

    /// Convert one file into output rows
    #[instrument(name = "merge_stream_file", skip(self, table), fields(file = %table.name))]
    pub fn process(&mut self, table: &SourceTable) -> StreamChunk {
        let mut warnings = RunWarnings::new();
        let segment = build_segment(table, &self.config);
        let FileSegment {
            source_name,
            mut reference,
            mut output,
        } = segment;

        if let Some(mismatch) = reconcile(&mut reference, &mut output) {
            warnings.push(mismatch);
        }

        let axis = time_axis(&reference, &self.config, &mut warnings);
        let first = self.files_seen == 0;
        self.files_seen += 1;

        if first {
            self.resolve_first(axis.as_ref(), &mut warnings);
        }

        let relative = match (&axis, &self.baseline) {
            (Some(axis), Some(baseline)) if Some(axis.source) == self.axis_source => {
                let relative = derive_relative(&axis.seconds, baseline);
                fill_time_columns(&mut output, &relative);
                Some(relative)
            }
            (Some(axis), Some(_)) => {
                warn!(
                    file = %source_name,
                    channel = %axis.channel,
                    "time axis differs from the first file, time columns stay empty"
                );
                None
            }
            _ => None,
        };

        if let Some(frequency) = self.config.output_frequency {
            output = self.resample(output, relative.as_deref(), frequency, first, &mut warnings);
        }

        counter!("merge_rows_merged_total").increment(reference.len() as u64);
        StreamChunk {
            source_name,
            frame: output,
            warnings,
        }
    }

    fn resolve_first(&mut self, axis: Option<&TimeAxis>, warnings: &mut RunWarnings) {
        let result = match axis {
            Some(axis) => {
                self.axis_source = Some(axis.source);
                resolve_file_baseline(self.config.baseline_candidate.as_ref(), axis)
            }
            None => Err(ContractError::baseline_unresolved(
                "first file has no usable timestamp or tick channel",
            )),
        };

        match result {
            Ok(baseline) => self.baseline = Some(baseline),
            Err(err) => {
                warn!(error = %err, "baseline unresolved, time columns stay empty for the run");
                warnings.push(err);
            }
        }
    }

    fn resample(
        &mut self,
        output: Frame,
        relative: Option<&[f64]>,
        frequency: f64,
        first: bool,
        warnings: &mut RunWarnings,
    ) -> Frame {
        let Some(relative) = relative else {
            if first {
                warnings.push(ContractError::downsample_skipped("no relative time axis"));
            }
            return output;
        };

        if self.grid_origin.is_none() {
            self.grid_origin = relative.iter().copied().find(|v| v.is_finite());
        }
        let Some(origin) = self.grid_origin else {
            warnings.push(ContractError::downsample_skipped(
                "time axis has no numeric values",
            ));
            return output;
        };

        match select_on_grid(relative, frequency, origin) {
            Ok(indices) => output.take_rows(&indices),
            Err(err) => {
                warn!(error = %err, "resampling skipped for file, keeping all rows");
                warnings.push(err);
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BaselineCandidate, BaselineOrigin, CellValue, Column, TIME_SECONDS_COLUMN,
    };

    fn table(name: &str, tick: &[f64], trig: &[f64], p1: &[f64]) -> SourceTable {
        SourceTable::new(
            name,
            vec![
                Column::from_f64("Tick", tick),
                Column::from_f64("Trig", trig),
                Column::from_f64("P1", p1),
            ],
        )
    }

    fn time_s(frame: &Frame) -> Vec<f64> {
        frame.column(TIME_SECONDS_COLUMN).unwrap().to_f64()
    }

    #[test]
    fn test_tick_run_with_pre_scanned_baseline() {
        let config = MergeConfig::new(["P1"])
            .with_tick("Tick")
            .with_candidate(BaselineCandidate::new(
                CellValue::Number(1000.0),
                BaselineSource::Tick,
            ));
        let engine = MergeEngine::new(config);
        let t = table("a.csv", &[1000.0, 1500.0, 2500.0], &[0.0; 3], &[1.0, 2.0, 3.0]);

        let outcome = engine.merge(vec![engine.segment(&t)]);
        assert_eq!(outcome.baseline.unwrap().origin, BaselineOrigin::PreScanned);
        assert_eq!(time_s(&outcome.frame), vec![0.0, 0.5, 1.5]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_trigger_spans_files() {
        let config = MergeConfig::new(["P1"])
            .with_tick("Tick")
            .with_trigger("Trig", 8.0)
            .with_candidate(BaselineCandidate::new(
                CellValue::Number(0.0),
                BaselineSource::Tick,
            ));
        let engine = MergeEngine::new(config);
        let a = table("a.csv", &[0.0, 100.0], &[5.0, 5.0], &[1.0, 2.0]);
        let b = table("b.csv", &[200.0, 300.0, 400.0], &[9.0, 3.0, 9.0], &[3.0, 4.0, 5.0]);

        let outcome = engine.merge(vec![engine.segment(&a), engine.segment(&b)]);
        let trigger = outcome.trigger.unwrap();
        assert_eq!(trigger.index, 2);

        let baseline = outcome.baseline.unwrap();
        assert_eq!(baseline.origin, BaselineOrigin::Trigger);
        assert_eq!(baseline.absolute_seconds, 0.2);
        assert_eq!(time_s(&outcome.frame), vec![-0.2, -0.1, 0.0, 0.1, 0.2]);
    }

    #[test]
    fn test_timestamp_preferred_over_tick() {
        let config = MergeConfig::new(["P1"]).with_timestamp("Time").with_tick("Tick");
        let engine = MergeEngine::new(config);
        let t = SourceTable::new(
            "a.csv",
            vec![
                Column::new(
                    "Time",
                    vec![CellValue::Text("00:10".into()), CellValue::Text("00:12".into())],
                ),
                Column::from_f64("Tick", &[0.0, 500.0]),
                Column::from_f64("P1", &[1.0, 2.0]),
            ],
        );

        let outcome = engine.merge(vec![engine.segment(&t)]);
        assert_eq!(outcome.baseline.unwrap().origin, BaselineOrigin::DerivedFirstFile);
        assert_eq!(time_s(&outcome.frame), vec![0.0, 2.0]);
    }

    #[test]
    fn test_trigger_row_without_timestamp_uses_tick() {
        let config = MergeConfig::new(["P1"])
            .with_timestamp("Time")
            .with_tick("Tick")
            .with_trigger("Trig", 8.0)
            .with_candidate(BaselineCandidate::new(
                CellValue::Number(10.0),
                BaselineSource::Timestamp,
            ));
        let engine = MergeEngine::new(config);
        let t = SourceTable::new(
            "a.csv",
            vec![
                Column::new(
                    "Time",
                    vec![CellValue::Number(10.0), CellValue::Number(11.0), CellValue::Null],
                ),
                Column::from_f64("Tick", &[0.0, 1000.0, 2000.0]),
                Column::from_f64("Trig", &[0.0, 0.0, 9.0]),
                Column::from_f64("P1", &[1.0, 2.0, 3.0]),
            ],
        );

        let outcome = engine.merge(vec![engine.segment(&t)]);
        assert_eq!(outcome.trigger.unwrap().index, 2);
        let baseline = outcome.baseline.unwrap();
        assert_eq!(baseline.origin, BaselineOrigin::Trigger);
        assert_eq!(baseline.absolute_seconds, 2.0);
        assert_eq!(time_s(&outcome.frame), vec![-2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_unresolved_baseline_keeps_rows() {
        let engine = MergeEngine::new(MergeConfig::new(["P1"]).with_tick("Tick").with_frequency(1.0));
        let t = SourceTable::new("a.csv", vec![Column::from_f64("P1", &[1.0, 2.0])]);

        let outcome = engine.merge(vec![engine.segment(&t)]);
        assert!(outcome.baseline.is_none());
        assert_eq!(outcome.frame.len(), 2);
        assert_eq!(outcome.warnings.count_kind("baseline_unresolved"), 1);
        assert_eq!(outcome.warnings.count_kind("downsample_skipped"), 1);
        assert!(outcome.frame.column(TIME_SECONDS_COLUMN).unwrap().values[0].is_null());
    }

    #[test]
    fn test_resampled_merge() {
        let engine = MergeEngine::new(MergeConfig::new(["P1"]).with_tick("Tick").with_frequency(1.0));
        let t = table(
            "a.csv",
            &[0.0, 300.0, 900.0, 1400.0, 2000.0],
            &[0.0; 5],
            &[10.0, 11.0, 12.0, 13.0, 14.0],
        );

        let outcome = engine.merge(vec![engine.segment(&t)]);
        assert_eq!(outcome.rows_merged, 5);
        assert_eq!(outcome.frame.column("P1").unwrap().to_f64(), vec![10.0, 12.0, 14.0]);
        assert_eq!(time_s(&outcome.frame), vec![0.0, 0.9, 2.0]);
    }

    #[test]
    fn test_streaming_reuses_first_file_baseline() {
        let mut merger = StreamingMerger::new(MergeConfig::new(["P1"]).with_tick("Tick"));
        let a = table("a.csv", &[5000.0, 5500.0], &[0.0; 2], &[1.0, 2.0]);
        let b = table("b.csv", &[6000.0, 7000.0], &[0.0; 2], &[3.0, 4.0]);

        let first = merger.process(&a);
        let second = merger.process(&b);

        assert_eq!(merger.baseline().unwrap().origin, BaselineOrigin::DerivedFirstFile);
        assert_eq!(time_s(&first.frame), vec![0.0, 0.5]);
        assert_eq!(time_s(&second.frame), vec![1.0, 2.0]);
        assert_eq!(merger.files_seen(), 2);
    }

    #[test]
    fn test_streaming_run_wide_grid() {
        let config = MergeConfig::new(["P1"]).with_tick("Tick").with_frequency(1.0);
        let mut merger = StreamingMerger::new(config);
        let a = table("a.csv", &[0.0, 400.0, 1100.0], &[0.0; 3], &[1.0, 2.0, 3.0]);
        let b = table("b.csv", &[1600.0, 2050.0, 3000.0], &[0.0; 3], &[4.0, 5.0, 6.0]);

        let first = merger.process(&a);
        let second = merger.process(&b);

        assert_eq!(time_s(&first.frame), vec![0.0, 1.1]);
        assert_eq!(time_s(&second.frame), vec![2.05, 3.0]);
    }
}
