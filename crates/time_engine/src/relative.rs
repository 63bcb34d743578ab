//! Relative time derivation and output time columns.

use contracts::{
    CellValue, Frame, ResolvedBaseline, SecondsSeries, TIME_HOURS_COLUMN, TIME_MINUTES_COLUMN,
    TIME_SECONDS_COLUMN,
};

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Relative seconds for every row; missing samples stay NaN
pub fn derive_relative(axis: &SecondsSeries, baseline: &ResolvedBaseline) -> Vec<f64> {
    axis.values
        .iter()
        .map(|&v| if v.is_nan() { v } else { baseline.relative(v) })
        .collect()
}

/// Write `Time_s`, `Time_min`, `Time_h` into `output`.
///
/// `relative` shorter than the frame leaves the remaining rows missing.
pub fn fill_time_columns(output: &mut Frame, relative: &[f64]) {
    let len = output.len();
    let column = |scale: f64| -> Vec<CellValue> {
        (0..len)
            .map(|i| match relative.get(i) {
                Some(&s) if !s.is_nan() => CellValue::Number(s / scale),
                _ => CellValue::Null,
            })
            .collect()
    };

    output.set_column(TIME_SECONDS_COLUMN, column(1.0));
    output.set_column(TIME_MINUTES_COLUMN, column(SECONDS_PER_MINUTE));
    output.set_column(TIME_HOURS_COLUMN, column(SECONDS_PER_HOUR));
}
