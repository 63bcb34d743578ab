//! Cell / Column / Frame - tabular data model
//!
//! Columns are named, ordered sequences of heterogeneous cells. A `Frame` keeps every
//! column at the same length; a `SourceTable` is what a reader yields for one file and
//! may hold channels of unequal length.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

/// Date/time layouts recognised when inferring a cell from text
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Layout used when rendering a native date/time cell
pub const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One raw sample
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// Missing sample
    #[default]
    Null,
    /// Numeric sample
    Number(f64),
    /// Free text
    Text(String),
    /// Native date/time (UTC, no zone attached)
    DateTime(NaiveDateTime),
    /// Native duration
    Duration(TimeDelta),
}

impl CellValue {
    /// Infer a cell from its textual form: empty → Null, number, date/time, otherwise text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }
        if let Ok(number) = trimmed.parse::<f64>() {
            return Self::Number(number);
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Self::DateTime(dt);
            }
        }
        Self::Text(trimmed.to_string())
    }

    /// Whether this cell is missing (Null or a NaN number)
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric coercion: numbers pass through, numeric text parses, everything else is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        (!value.is_nan()).then_some(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<TimeDelta> for CellValue {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(v) if v.is_nan() => Ok(()),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_OUTPUT_FORMAT)),
            Self::Duration(d) => write!(f, "{}", duration_seconds(d)),
        }
    }
}

/// Total seconds of a duration, including the sub-second part
pub fn duration_seconds(delta: &TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Named column of raw samples
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Cleaned channel name
    pub name: String,
    /// Samples in row order
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column of `len` missing samples
    pub fn nulls(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![CellValue::Null; len])
    }

    /// Numeric column from plain floats (NaN means missing)
    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().map(|&v| CellValue::Number(v)).collect())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric view; non-numeric samples become NaN
    pub fn to_f64(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect()
    }

    /// Number of non-missing samples
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }
}

/// Ordered set of equal-length columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    len: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame; shorter columns are padded with missing samples to the longest.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let len = columns.iter().map(Column::len).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.values.resize(len, CellValue::Null);
                c
            })
            .collect();
        Self { columns, len }
    }

    /// Row count
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column count
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Extend every column with missing samples up to `len` rows.
    ///
    /// A frame without columns still carries its row count.
    pub fn pad_to(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        for column in &mut self.columns {
            column.values.resize(len, CellValue::Null);
        }
        self.len = len;
    }

    /// Replace the values of an existing column, or append a new one.
    ///
    /// `values` must match the frame length unless the frame is still empty.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        if self.columns.is_empty() && self.len == 0 {
            self.len = values.len();
        }
        debug_assert_eq!(values.len(), self.len, "column length must match frame");
        let mut values = values;
        values.resize(self.len, CellValue::Null);
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
    }

    /// Concatenate `other` below `self`; columns are matched by name and
    /// any column missing on one side is filled with missing samples.
    pub fn append(&mut self, other: Frame) {
        let own_len = self.len;
        let other_len = other.len;

        for column in &mut self.columns {
            if !other.has_column(&column.name) {
                column.values.resize(own_len + other_len, CellValue::Null);
            }
        }

        for incoming in other.columns {
            match self.columns.iter_mut().find(|c| c.name == incoming.name) {
                Some(existing) => existing.values.extend(incoming.values),
                None => {
                    let mut values = vec![CellValue::Null; own_len];
                    values.extend(incoming.values);
                    self.columns.push(Column::new(incoming.name, values));
                }
            }
        }

        self.len = own_len + other_len;
    }

    /// Keep only the first `len` rows
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        for column in &mut self.columns {
            column.values.truncate(len);
        }
        self.len = len;
    }

    /// New frame holding only the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    c.name.clone(),
                    indices.iter().map(|&i| c.values[i].clone()).collect(),
                )
            })
            .collect();
        Frame {
            columns,
            len: indices.len(),
        }
    }

    /// Cells of one row, in column order
    pub fn row(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.columns.iter().map(move |c| &c.values[index])
    }
}

/// Per-file table as produced by a reader (channels may differ in length)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTable {
    /// Source file name (no directory)
    pub name: String,
    /// Cleaned, de-duplicated channels in file order
    pub columns: Vec<Column>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Longest channel length
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }
}
