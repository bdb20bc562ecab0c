/// MineTable Column Implementation
///
/// A Column is an array-like random-access data container indexed by integer.
/// Each Column has a type specifying the type of every value stored; any cell
/// may also hold `ColumnValue::Null`, the missing-value marker.
///
/// # Typed access
///
/// Numeric routines never inspect raw `ColumnValue`s. They go through
/// `NumericColumn`, a borrowed handle that can only be built for a numeric
/// column, so a type mismatch is reported where the column is looked up.

use crate::error::{Result, TableError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
    DateTime,
    /// Text labels produced by discretization
    Category,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int32 | ColumnType::Int64 | ColumnType::Float32 | ColumnType::Float64
        )
    }

    /// Parse a text cell into a value of this type.
    ///
    /// Empty text is the missing marker. Returns None when the text cannot be
    /// represented in this type.
    pub fn parse_text(&self, text: &str) -> Option<ColumnValue> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Some(ColumnValue::Null);
        }

        match self {
            ColumnType::Int32 => trimmed.parse::<i32>().ok().map(ColumnValue::Int32),
            ColumnType::Int64 => trimmed.parse::<i64>().ok().map(ColumnValue::Int64),
            ColumnType::Float32 => trimmed.parse::<f32>().ok().map(ColumnValue::Float32),
            ColumnType::Float64 => trimmed.parse::<f64>().ok().map(ColumnValue::Float64),
            ColumnType::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(ColumnValue::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(ColumnValue::Bool(false))
                } else {
                    None
                }
            }
            ColumnType::DateTime => parse_datetime(trimmed).map(ColumnValue::DateTime),
            ColumnType::String | ColumnType::Category => {
                Some(ColumnValue::String(trimmed.to_string()))
            }
        }
    }
}

/// Column value enum to support multiple types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ColumnValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric variant widened to f64. Float32 values widen to the f64
    /// nearest their shortest decimal form, so `36.1f32` becomes `36.1`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int32(n) => Some(*n as f64),
            ColumnValue::Int64(n) => Some(*n as f64),
            ColumnValue::Float32(f) => Some(widen_f32(*f)),
            ColumnValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            ColumnValue::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Hashable identity used for duplicate detection and mode counting.
    ///
    /// Numbers compare by value regardless of storage width, so `Int32(1)`
    /// and `Float64(1.0)` share a key.
    pub(crate) fn key(&self) -> ValueKey {
        if let Some(n) = self.to_f64() {
            return ValueKey::Number(canonical_bits(n));
        }
        match self {
            ColumnValue::String(s) => ValueKey::Text(s.clone()),
            ColumnValue::Bool(b) => ValueKey::Bool(*b),
            ColumnValue::DateTime(dt) => ValueKey::DateTime(*dt),
            _ => ValueKey::Null,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ColumnValue::Bool(_) => 0,
            ColumnValue::Int32(_)
            | ColumnValue::Int64(_)
            | ColumnValue::Float32(_)
            | ColumnValue::Float64(_) => 1,
            ColumnValue::DateTime(_) => 2,
            ColumnValue::String(_) => 3,
            ColumnValue::Null => 4,
        }
    }

    /// Total order used to sort modal values: numbers ascending, text
    /// lexicographic, missing last.
    pub(crate) fn total_cmp(&self, other: &ColumnValue) -> Ordering {
        if let (Some(a), Some(b)) = (self.to_f64(), other.to_f64()) {
            return a.total_cmp(&b);
        }
        match (self, other) {
            (ColumnValue::String(a), ColumnValue::String(b)) => a.cmp(b),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a.cmp(b),
            (ColumnValue::DateTime(a), ColumnValue::DateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int32(n) => write!(f, "{}", n),
            ColumnValue::Int64(n) => write!(f, "{}", n),
            ColumnValue::Float32(v) => write!(f, "{}", v),
            ColumnValue::Float64(v) => write!(f, "{}", v),
            ColumnValue::String(s) => f.write_str(s),
            ColumnValue::Bool(b) => write!(f, "{}", b),
            ColumnValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            ColumnValue::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Number(u64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

fn widen_f32(f: f32) -> f64 {
    if !f.is_finite() {
        return f as f64;
    }
    f.to_string().parse().unwrap_or(f as f64)
}

/// Bit pattern used for hashing numbers: all NaNs alike, `-0.0` equals `0.0`.
pub(crate) fn canonical_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

/// Parse the timestamp layouts found in CSV exports: RFC 3339, ISO 8601 with
/// a `T` or a space separator (optional fractional seconds), or a bare date.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for layout in LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Named, typed sequence of values.
#[derive(Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
            values: Vec::new(),
        }
    }

    /// Build a column from existing values, validating every one.
    pub fn from_values(
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<ColumnValue>,
    ) -> Result<Self> {
        let mut column = Column::new(name, column_type);
        column.values.reserve(values.len());
        for value in values {
            column.append(value)?;
        }
        Ok(column)
    }

    /// Build a Float64 column; `None` becomes missing.
    pub fn float64(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Column {
            name: name.into(),
            column_type: ColumnType::Float64,
            values: values
                .into_iter()
                .map(|v| v.map_or(ColumnValue::Null, ColumnValue::Float64))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate value against the column type
    fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue> {
        match (&value, self.column_type) {
            (ColumnValue::Null, _) => Ok(value),
            (ColumnValue::Int32(_), ColumnType::Int32) => Ok(value),
            (ColumnValue::Int64(_), ColumnType::Int64) => Ok(value),
            (ColumnValue::Float32(_), ColumnType::Float32) => Ok(value),
            (ColumnValue::Float64(_), ColumnType::Float64) => Ok(value),
            (ColumnValue::String(_), ColumnType::String | ColumnType::Category) => Ok(value),
            (ColumnValue::Bool(_), ColumnType::Bool) => Ok(value),
            (ColumnValue::DateTime(_), ColumnType::DateTime) => Ok(value),
            _ => Err(TableError::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type,
                found: format!("{:?}", value),
            }),
        }
    }

    /// Parse user-entered text into a value of this column's type.
    pub fn parse_value(&self, text: &str) -> Result<ColumnValue> {
        self.column_type
            .parse_text(text)
            .ok_or_else(|| TableError::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type,
                found: format!("'{}'", text),
            })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.values.len() {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<ColumnValue> {
        self.check_index(index)?;
        Ok(self.values[index].clone())
    }

    pub fn get_ref(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Fast numeric access - returns the value as f64 without cloning ColumnValue.
    /// Returns None if the value is null, not a numeric type, or index out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(ColumnValue::to_f64)
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(ColumnValue::Null))
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn set(&mut self, index: usize, value: ColumnValue) -> Result<()> {
        self.check_index(index)?;
        let value = self.validate_value(value)?;
        self.values[index] = value;
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: ColumnValue) -> Result<()> {
        if index > self.values.len() {
            return Err(TableError::RowOutOfRange {
                row: index,
                len: self.values.len(),
            });
        }
        let value = self.validate_value(value)?;
        self.values.insert(index, value);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<ColumnValue> {
        self.check_index(index)?;
        Ok(self.values.remove(index))
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<()> {
        let value = self.validate_value(value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    /// New column holding the rows at `indices`, in that order.
    pub(crate) fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            column_type: self.column_type,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }

    /// Replace every missing cell with `fill`, returning how many were filled.
    pub(crate) fn fill_missing(&mut self, fill: &ColumnValue) -> Result<usize> {
        let fill = self.validate_value(fill.clone())?;
        let mut filled = 0;
        for value in self.values.iter_mut().filter(|v| v.is_null()) {
            *value = fill.clone();
            filled += 1;
        }
        Ok(filled)
    }

    /// Borrow this column as a numeric handle.
    pub fn as_numeric(&self) -> Result<NumericColumn<'_>> {
        NumericColumn::try_new(self)
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, len: {} }}",
            self.name,
            self.column_type,
            self.len()
        )
    }
}

/// Borrowed view of a numeric column.
#[derive(Debug, Clone, Copy)]
pub struct NumericColumn<'a> {
    column: &'a Column,
}

impl<'a> NumericColumn<'a> {
    fn try_new(column: &'a Column) -> Result<Self> {
        if !column.column_type.is_numeric() {
            return Err(TableError::NotNumeric {
                column: column.name.clone(),
                actual: column.column_type,
            });
        }
        Ok(NumericColumn { column })
    }

    pub fn name(&self) -> &'a str {
        &self.column.name
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.column.get_f64(index)
    }

    /// Every cell widened to f64, `None` for missing.
    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + 'a {
        self.column.values.iter().map(ColumnValue::to_f64)
    }

    /// Present (non-missing) values in row order.
    pub fn present(&self) -> Vec<f64> {
        self.values().flatten().collect()
    }
}
