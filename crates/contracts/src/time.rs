//! Time model - unit tags, seconds series, baseline values

use serde::{Deserialize, Serialize};

use crate::CellValue;

/// Tick channels count milliseconds
pub const TICKS_PER_SECOND: f64 = 1000.0;

/// Numeric medians above this are nanosecond epochs
pub const EPOCH_NS_THRESHOLD: f64 = 1e12;

/// Numeric medians above this (and not epoch ns) are fractional day counts
pub const DAY_COUNT_THRESHOLD: f64 = 10_000.0;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Relative time resolution (seconds)
pub const RELATIVE_TIME_RESOLUTION: f64 = 1e-6;

const MICROS_PER_SECOND: f64 = 1e6;

/// Round seconds to the relative-time resolution (1 µs)
pub fn round_micros(seconds: f64) -> f64 {
    (seconds * MICROS_PER_SECOND).round() / MICROS_PER_SECOND
}

/// Representation a raw time column was recognised as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitTag {
    /// Native date/time, epoch nanoseconds / 1e9
    DatetimeEpochSeconds,
    /// Native duration, total seconds
    TimedeltaSeconds,
    /// Numeric nanosecond epoch
    EpochNs,
    /// Numeric fractional day count
    Days,
    /// Numeric seconds
    Seconds,
    /// `HH:MM:SS[.ss]` or `MM:SS[.ss]` clock strings
    HmsOrMmss,
}

impl UnitTag {
    /// Classify a numeric column by the median of its coerced values
    pub fn from_numeric_median(median: f64) -> Self {
        if median > EPOCH_NS_THRESHOLD {
            Self::EpochNs
        } else if median > DAY_COUNT_THRESHOLD {
            Self::Days
        } else {
            Self::Seconds
        }
    }

    /// Convert one numeric sample expressed in this unit into seconds
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::EpochNs => value / 1e9,
            Self::Days => value * SECONDS_PER_DAY,
            Self::DatetimeEpochSeconds
            | Self::TimedeltaSeconds
            | Self::Seconds
            | Self::HmsOrMmss => value,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DatetimeEpochSeconds => "datetime_epoch_seconds",
            Self::TimedeltaSeconds => "timedelta_seconds",
            Self::EpochNs => "epoch_ns",
            Self::Days => "days",
            Self::Seconds => "seconds",
            Self::HmsOrMmss => "hms_or_mmss",
        }
    }
}

impl std::fmt::Display for UnitTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute seconds recovered from one raw time column
///
/// NaN marks an unparseable sample. Never mutated after detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondsSeries {
    pub values: Vec<f64>,
    pub unit: UnitTag,
}

impl SecondsSeries {
    pub fn new(values: Vec<f64>, unit: UnitTag) -> Self {
        Self { values, unit }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index` if present and not missing
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().filter(|v| !v.is_nan())
    }

    /// First non-missing value within `range`
    pub fn first_valid_in(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let end = range.end.min(self.values.len());
        let start = range.start.min(end);
        self.values[start..end].iter().copied().find(|v| !v.is_nan())
    }

    /// First non-missing value in the whole series
    pub fn first_valid(&self) -> Option<f64> {
        self.first_valid_in(0..self.values.len())
    }

    /// Count of non-missing values
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Which time channel a baseline value was read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Timestamp channel (any representation)
    #[default]
    Timestamp,
    /// Millisecond tick counter
    Tick,
}

/// Raw zero-reference captured by the pre-scan from the first row of the first file
///
/// Passed into the conversion run as plain input data; never recomputed mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineCandidate {
    pub raw_value: CellValue,
    pub source_kind: BaselineSource,
}

impl BaselineCandidate {
    pub fn new(raw_value: CellValue, source_kind: BaselineSource) -> Self {
        Self {
            raw_value,
            source_kind,
        }
    }
}

/// Where the resolved baseline came from, in fallback priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineOrigin {
    Trigger,
    PreScanned,
    DerivedFirstFile,
    DerivedFirstRow,
}

impl std::fmt::Display for BaselineOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Trigger => "trigger",
            Self::PreScanned => "pre-scanned",
            Self::DerivedFirstFile => "derived-first-file",
            Self::DerivedFirstRow => "derived-first-row",
        };
        f.write_str(name)
    }
}

/// The single zero-reference applied to every row of every file in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBaseline {
    pub absolute_seconds: f64,
    pub origin: BaselineOrigin,
}

impl ResolvedBaseline {
    pub fn new(absolute_seconds: f64, origin: BaselineOrigin) -> Self {
        Self {
            absolute_seconds,
            origin,
        }
    }

    /// Relative seconds for one absolute sample, rounded to 1 µs
    pub fn relative(&self, absolute_seconds: f64) -> f64 {
        round_micros(absolute_seconds - self.absolute_seconds)
    }
}
