//! Nearest-neighbour resampling onto a fixed-rate grid.

use contracts::{ContractError, RELATIVE_TIME_RESOLUTION};

/// Grid comparisons tolerate half the relative-time resolution
const GRID_TOLERANCE: f64 = RELATIVE_TIME_RESOLUTION / 2.0;

/// 单次重采样允许的最大目标点数
pub const MAX_GRID_TARGETS: u64 = 10_000_000;

/// Select source rows nearest to `t_min, t_min + 1/f, …, ≤ t_max`.
///
/// `t_min`/`t_max` are the first and last non-missing values in record order. The returned
/// indices are strictly increasing.
pub fn select_nearest(axis: &[f64], frequency: f64) -> Result<Vec<usize>, ContractError> {
    let (t_min, t_max) = span(axis).ok_or_else(|| {
        ContractError::downsample_skipped("time axis has no numeric values")
    })?;
    if t_max + GRID_TOLERANCE < t_min {
        return Err(ContractError::downsample_skipped(format!(
            "last time {t_max} precedes first time {t_min}"
        )));
    }

    let grid = grid(t_min, 0, t_max, frequency)?;
    Ok(select(axis, grid))
}

/// Select rows of one file against a run-wide grid `origin + k/f`.
///
/// Only targets inside the file's own first/last span are used. Returns an empty selection
/// when no target falls inside the span.
pub fn select_on_grid(
    axis: &[f64],
    frequency: f64,
    origin: f64,
) -> Result<Vec<usize>, ContractError> {
    let (t_min, t_max) = span(axis).ok_or_else(|| {
        ContractError::downsample_skipped("time axis has no numeric values")
    })?;
    check_frequency(frequency)?;

    let first_k = ((t_min - origin) * frequency - GRID_TOLERANCE * frequency)
        .ceil()
        .max(0.0) as u64;
    let grid = grid(origin, first_k, t_max, frequency)?;
    Ok(select(axis, grid))
}

/// First and last non-missing values in record order
fn span(axis: &[f64]) -> Option<(f64, f64)> {
    let first = axis.iter().copied().find(|v| v.is_finite())?;
    let last = axis.iter().rev().copied().find(|v| v.is_finite())?;
    Some((first, last))
}

fn check_frequency(frequency: f64) -> Result<(), ContractError> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(ContractError::downsample_skipped(format!(
            "invalid frequency {frequency}"
        )))
    }
}

/// Targets `origin + k/f` for `k ≥ first_k`, not exceeding `t_max`, walked lazily.
///
/// Fails with `DownsampleSkipped` when the span holds more than [`MAX_GRID_TARGETS`] targets.
fn grid(
    origin: f64,
    first_k: u64,
    t_max: f64,
    frequency: f64,
) -> Result<impl Iterator<Item = f64>, ContractError> {
    check_frequency(frequency)?;
    let estimate = ((t_max + GRID_TOLERANCE - origin) * frequency).floor() - first_k as f64 + 1.0;
    if estimate > MAX_GRID_TARGETS as f64 {
        return Err(ContractError::downsample_skipped(format!(
            "{frequency} Hz over [{origin}, {t_max}] needs about {estimate:.0} targets (limit {MAX_GRID_TARGETS})"
        )));
    }
    Ok((first_k..)
        .map(move |k| origin + k as f64 / frequency)
        .take_while(move |&t| t <= t_max + GRID_TOLERANCE))
}

fn is_monotonic(axis: &[f64]) -> bool {
    axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[0] <= w[1])
}

/// Nearest index per target, then collapse to a strictly increasing selection
fn select(axis: &[f64], targets: impl Iterator<Item = f64>) -> Vec<usize> {
    if axis.is_empty() {
        return Vec::new();
    }

    let sorted = is_monotonic(axis);
    let mut selected: Vec<usize> = Vec::new();
    for t in targets {
        let nearest = if sorted {
            Some(nearest_sorted(axis, t))
        } else {
            nearest_scan(axis, t)
        };
        if let Some(index) = nearest {
            if selected.last().map_or(true, |&last| index > last) {
                selected.push(index);
            }
        }
    }
    selected
}

/// Binary search on a non-decreasing axis; the earlier neighbour wins unless the later
/// one is strictly closer.
fn nearest_sorted(axis: &[f64], t: f64) -> usize {
    let pos = axis.partition_point(|&v| v < t);
    if pos == 0 {
        return 0;
    }
    if pos == axis.len() {
        return axis.len() - 1;
    }
    let (left, right) = (pos - 1, pos);
    if (axis[right] - t).abs() < (axis[left] - t).abs() {
        right
    } else {
        left
    }
}

/// Full scan for an unordered axis; the earliest index wins ties
fn nearest_scan(axis: &[f64], t: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in axis.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        let distance = (v - t).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}
