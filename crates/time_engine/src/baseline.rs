//! Baseline resolution: one zero-reference for the whole run.

use contracts::{
    BaselineCandidate, BaselineOrigin, BaselineSource, ContractError, ResolvedBaseline,
    SecondsSeries,
};
use tracing::{info, warn};

use crate::unit::candidate_seconds;

/// Absolute-seconds axis of the combined record and the channel kind it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub seconds: SecondsSeries,
    pub source: BaselineSource,
    /// Channel the axis was derived from
    pub channel: String,
}

impl TimeAxis {
    pub fn new(seconds: SecondsSeries, source: BaselineSource, channel: impl Into<String>) -> Self {
        Self {
            seconds,
            source,
            channel: channel.into(),
        }
    }
}

/// Inputs to baseline resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineInputs<'a> {
    /// Trigger row in the combined record
    pub trigger_index: Option<usize>,
    /// Pre-scanned candidate
    pub candidate: Option<&'a BaselineCandidate>,
    /// Usable time axes in preference order: timestamp, then tick
    pub axes: &'a [TimeAxis],
    /// Rows contributed by the first file
    pub first_file_rows: usize,
}

/// Pick the run baseline: trigger row, pre-scanned candidate, first file, first row.
///
/// Fails with `BaselineUnresolved` when no source yields a value.
pub fn resolve_baseline(inputs: BaselineInputs<'_>) -> Result<ResolvedBaseline, ContractError> {
    resolve_with_axis(inputs).map(|(baseline, _)| baseline)
}

/// Like [`resolve_baseline`], also returning the axis the baseline was read from.
///
/// The trigger row is read from the first axis with a value there, so a timestamp gap at
/// the trigger falls back to the tick channel. Every later step uses the preferred axis.
/// Relative time must be derived from the returned axis.
pub fn resolve_with_axis<'a>(
    inputs: BaselineInputs<'a>,
) -> Result<(ResolvedBaseline, &'a TimeAxis), ContractError> {
    let Some(axis) = inputs.axes.first() else {
        return Err(ContractError::baseline_unresolved(
            "no timestamp or tick axis available",
        ));
    };

    if let Some(index) = inputs.trigger_index {
        let hit = inputs
            .axes
            .iter()
            .find_map(|a| a.seconds.get(index).map(|seconds| (seconds, a)));
        match hit {
            Some((seconds, trigger_axis)) => {
                return Ok((
                    resolved(seconds, BaselineOrigin::Trigger, trigger_axis),
                    trigger_axis,
                ))
            }
            None => warn!(
                index,
                channels = ?inputs.axes.iter().map(|a| a.channel.as_str()).collect::<Vec<_>>(),
                "time missing at trigger row, falling back"
            ),
        }
    }

    if let Some(candidate) = inputs.candidate {
        if let Some(seconds) = pre_scanned(candidate, axis) {
            return Ok((resolved(seconds, BaselineOrigin::PreScanned, axis), axis));
        }
    }

    if let Some(seconds) = axis.seconds.first_valid_in(0..inputs.first_file_rows) {
        return Ok((resolved(seconds, BaselineOrigin::DerivedFirstFile, axis), axis));
    }

    if let Some(seconds) = axis.seconds.first_valid() {
        return Ok((resolved(seconds, BaselineOrigin::DerivedFirstRow, axis), axis));
    }

    Err(ContractError::baseline_unresolved(format!(
        "no valid sample in '{}'",
        axis.channel
    )))
}

/// Baseline for one file in isolation (streaming): candidate, then the file's first valid sample.
pub fn resolve_file_baseline(
    candidate: Option<&BaselineCandidate>,
    axis: &TimeAxis,
) -> Result<ResolvedBaseline, ContractError> {
    resolve_baseline(BaselineInputs {
        trigger_index: None,
        candidate,
        axes: std::slice::from_ref(axis),
        first_file_rows: axis.seconds.len(),
    })
}

fn pre_scanned(candidate: &BaselineCandidate, axis: &TimeAxis) -> Option<f64> {
    if candidate.source_kind != axis.source {
        warn!(
            candidate = ?candidate.source_kind,
            axis = ?axis.source,
            "pre-scanned candidate does not match the time axis, ignoring it"
        );
        return None;
    }

    let seconds = candidate_seconds(candidate, Some(axis.seconds.unit));
    if seconds.is_none() {
        warn!(raw_value = %candidate.raw_value, "pre-scanned candidate is not a time value");
    }
    seconds
}

fn resolved(seconds: f64, origin: BaselineOrigin, axis: &TimeAxis) -> ResolvedBaseline {
    info!(
        baseline_seconds = seconds,
        %origin,
        channel = %axis.channel,
        unit = %axis.seconds.unit,
        "baseline resolved"
    );
    ResolvedBaseline::new(seconds, origin)
}
