//! Unit detection: raw time column → absolute seconds.

use chrono::NaiveDateTime;
use contracts::{
    duration_seconds, BaselineCandidate, BaselineSource, CellValue, Column, ContractError,
    SecondsSeries, UnitTag, TICKS_PER_SECOND,
};
use tracing::debug;

/// Classify one raw time column and recover absolute seconds.
///
/// Classification order: native date/time, native duration, mostly-numeric (by median),
/// clock strings. Individual samples that do not fit become NaN.
pub fn detect_units(column: &Column) -> Result<SecondsSeries, ContractError> {
    let series = if is_native(column, |v| matches!(v, CellValue::DateTime(_))) {
        SecondsSeries::new(
            map_cells(column, |v| match v {
                CellValue::DateTime(dt) => Some(epoch_seconds(dt)),
                _ => None,
            }),
            UnitTag::DatetimeEpochSeconds,
        )
    } else if is_native(column, |v| matches!(v, CellValue::Duration(_))) {
        SecondsSeries::new(
            map_cells(column, |v| match v {
                CellValue::Duration(d) => Some(duration_seconds(d)),
                _ => None,
            }),
            UnitTag::TimedeltaSeconds,
        )
    } else {
        // Majority over every row; empty cells count against the numeric branch
        let numeric: Vec<f64> = column.to_f64();
        let coerced = numeric.iter().filter(|v| !v.is_nan()).count();

        if coerced * 2 > column.len() {
            let unit = UnitTag::from_numeric_median(median(&numeric).unwrap_or(0.0));
            SecondsSeries::new(
                numeric
                    .into_iter()
                    .map(|v| if v.is_nan() { v } else { unit.apply(v) })
                    .collect(),
                unit,
            )
        } else {
            SecondsSeries::new(
                map_cells(column, |v| match v {
                    CellValue::Text(s) => parse_clock(s),
                    _ => None,
                }),
                UnitTag::HmsOrMmss,
            )
        }
    };

    if series.valid_count() == 0 {
        return Err(ContractError::unparsable(column.name.clone()));
    }

    debug!(
        column = %column.name,
        unit = %series.unit,
        valid = series.valid_count(),
        total = series.len(),
        "time column classified"
    );
    Ok(series)
}

/// Millisecond tick column → seconds
pub fn tick_seconds(column: &Column) -> Result<SecondsSeries, ContractError> {
    let series = SecondsSeries::new(
        column
            .to_f64()
            .into_iter()
            .map(|v| v / TICKS_PER_SECOND)
            .collect(),
        UnitTag::Seconds,
    );
    if series.valid_count() == 0 {
        return Err(ContractError::unparsable(column.name.clone()));
    }
    Ok(series)
}

/// Convert a pre-scanned candidate into seconds, in the unit system of the bulk series.
///
/// Tick candidates are milliseconds. A bare number on a timestamp candidate follows
/// `bulk_unit` when that is a numeric tag, otherwise it is classified on its own.
pub fn candidate_seconds(candidate: &BaselineCandidate, bulk_unit: Option<UnitTag>) -> Option<f64> {
    match candidate.source_kind {
        BaselineSource::Tick => candidate
            .raw_value
            .as_f64()
            .map(|v| v / TICKS_PER_SECOND),
        BaselineSource::Timestamp => match &candidate.raw_value {
            CellValue::DateTime(dt) => Some(epoch_seconds(dt)),
            CellValue::Duration(d) => Some(duration_seconds(d)),
            CellValue::Number(v) if !v.is_nan() => Some(numeric_in_unit(*v, bulk_unit)),
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if !v.is_nan() => Some(numeric_in_unit(v, bulk_unit)),
                _ => parse_clock(s),
            },
            _ => None,
        },
    }
}

fn numeric_in_unit(value: f64, bulk_unit: Option<UnitTag>) -> f64 {
    let unit = match bulk_unit {
        Some(unit @ (UnitTag::EpochNs | UnitTag::Days | UnitTag::Seconds)) => unit,
        _ => UnitTag::from_numeric_median(value),
    };
    unit.apply(value)
}

/// Parse `MM:SS[.ss]` or `HH:MM:SS[.ss]` into seconds
pub fn parse_clock(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let mut fields = Vec::with_capacity(parts.len());
    for part in &parts {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }
        let value = part.parse::<f64>().ok().filter(|v| v.is_finite())?;
        fields.push(value);
    }

    match fields.as_slice() {
        [minutes, seconds] => Some(minutes * 60.0 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600.0 + minutes * 60.0 + seconds),
        _ => None,
    }
}

/// Seconds since the Unix epoch, sub-second part included
pub fn epoch_seconds(dt: &NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9
}

fn is_native(column: &Column, pred: impl Fn(&CellValue) -> bool) -> bool {
    let mut present = column.values.iter().filter(|v| !v.is_null()).peekable();
    present.peek().is_some() && present.all(pred)
}

fn map_cells(column: &Column, f: impl Fn(&CellValue) -> Option<f64>) -> Vec<f64> {
    column
        .values
        .iter()
        .map(|v| f(v).unwrap_or(f64::NAN))
        .collect()
}

/// Median of the non-NaN values; mean of the two middle values for even counts
fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    const TOL: f64 = 1e-6;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            if e.is_nan() {
                assert!(a.is_nan(), "expected NaN, got {a}");
            } else {
                assert!((a - e).abs() < TOL, "expected {e}, got {a}");
            }
        }
    }

    #[test]
    fn test_native_datetime() {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 250)
            .unwrap();
        let truth = base.and_utc().timestamp() as f64 + 0.25;
        let column = Column::new(
            "Time",
            vec![
                CellValue::DateTime(base),
                CellValue::Null,
                CellValue::DateTime(base + TimeDelta::milliseconds(1500)),
            ],
        );

        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::DatetimeEpochSeconds);
        assert_close(&series.values, &[truth, f64::NAN, truth + 1.5]);
    }

    #[test]
    fn test_native_duration() {
        let column = Column::new(
            "Elapsed",
            vec![
                CellValue::Duration(TimeDelta::milliseconds(0)),
                CellValue::Duration(TimeDelta::milliseconds(2500)),
            ],
        );
        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::TimedeltaSeconds);
        assert_close(&series.values, &[0.0, 2.5]);
    }

    #[test]
    fn test_numeric_epoch_ns() {
        let column = Column::from_f64("Time", &[1.7e18, 1.7e18 + 5e8]);
        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::EpochNs);
        assert_close(&series.values, &[1.7e9, 1.7e9 + 0.5]);
    }

    #[test]
    fn test_numeric_days() {
        let column = Column::from_f64("Time", &[45_000.0, 45_000.5]);
        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::Days);
        assert_close(&series.values, &[45_000.0 * 86_400.0, 45_000.5 * 86_400.0]);
    }

    #[test]
    fn test_numeric_seconds_with_stray_text() {
        let column = Column::new(
            "Time",
            vec![
                CellValue::Number(0.5),
                CellValue::Text("n/a".into()),
                CellValue::Text("1.5".into()),
            ],
        );
        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::Seconds);
        assert_close(&series.values, &[0.5, f64::NAN, 1.5]);
    }

    #[test]
    fn test_clock_strings() {
        let column = Column::new(
            "Clock",
            vec![
                CellValue::Text("01:30".into()),
                CellValue::Text("01:02:03.5".into()),
                CellValue::Text("bad".into()),
                CellValue::Text("1::2".into()),
            ],
        );
        let series = detect_units(&column).unwrap();
        assert_eq!(series.unit, UnitTag::HmsOrMmss);
        assert_close(&series.values, &[90.0, 3723.5, f64::NAN, f64::NAN]);
    }

    #[test]
    fn test_all_missing_is_unparsable() {
        let column = Column::new(
            "Time",
            vec![CellValue::Null, CellValue::Text("garbage".into())],
        );
        let err = detect_units(&column).unwrap_err();
        assert!(matches!(err, ContractError::UnparsableSeries { ref column } if column == "Time"));
    }

    #[test]
    fn test_mostly_empty_numeric_is_not_numeric() {
        let column = Column::new(
            "Time",
            vec![
                CellValue::Null,
                CellValue::Null,
                CellValue::Null,
                CellValue::Number(5.0),
            ],
        );
        let err = detect_units(&column).unwrap_err();
        assert!(matches!(err, ContractError::UnparsableSeries { .. }));

        // Exactly half is not a majority either
        let half = Column::new("Time", vec![CellValue::Null, CellValue::Number(5.0)]);
        assert!(detect_units(&half).is_err());
    }

    #[test]
    fn test_tick_seconds() {
        let column = Column::from_f64("Tick", &[1000.0, 1500.0, 2500.0]);
        let series = tick_seconds(&column).unwrap();
        assert_close(&series.values, &[1.0, 1.5, 2.5]);
    }

    #[test]
    fn test_candidate_follows_bulk_unit() {
        let days = BaselineCandidate::new(CellValue::Number(0.5), BaselineSource::Timestamp);
        assert_eq!(candidate_seconds(&days, Some(UnitTag::Days)), Some(43_200.0));
        assert_eq!(candidate_seconds(&days, Some(UnitTag::Seconds)), Some(0.5));

        let tick = BaselineCandidate::new(CellValue::Number(1000.0), BaselineSource::Tick);
        assert_eq!(candidate_seconds(&tick, None), Some(1.0));

        let clock = BaselineCandidate::new(CellValue::Text("00:10".into()), BaselineSource::Timestamp);
        assert_eq!(candidate_seconds(&clock, Some(UnitTag::HmsOrMmss)), Some(10.0));
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(&[4.0, 1.0, f64::NAN, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN]), None);
    }
}
