use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::error::ShapeError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, normalised across all input formats.
/// Unique values are collected into a `BTreeSet`, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// `YYYY-MM-DD HH:MM:SS` (or the source's own ISO text).
    DateTime(String),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        // Integers and floats share a rank so that numeric columns sort by value.
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
                DateTime(_) => 4,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Equal magnitudes: the integer goes first, keeping Ord consistent with PartialEq.
            (Integer(a), Float(b)) => cmp_int_float(*a, *b).then(Ordering::Less),
            (Float(a), Integer(b)) => cmp_int_float(*b, *a).reverse().then(Ordering::Greater),
            (String(a), String(b)) | (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Exact integer/float comparison; `i as f64` would round above 2^53.
/// NaNs order like `f64::total_cmp`: negative NaN first, positive NaN last.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    // In [-2^63, 2^63) the floor is exactly representable as i64.
    let floor = f.floor();
    match i.cmp(&(floor as i64)) {
        Ordering::Equal if f > floor => Ordering::Less,
        other => other,
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NaN"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::String(s) | CellValue::DateTime(s) => write!(f, "{s}"),
        }
    }
}

impl CellValue {
    /// A float cell, treating NaN as a missing value.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Null
        } else {
            CellValue::Float(v)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – the declared type of a column
// ---------------------------------------------------------------------------

/// Column type inferred from the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    String,
    DateTime,
    Mixed,
    /// No non-null values at all.
    Null,
}

impl ColumnType {
    fn of(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Null => None,
            CellValue::Bool(_) => Some(ColumnType::Bool),
            CellValue::Integer(_) => Some(ColumnType::Int64),
            CellValue::Float(_) => Some(ColumnType::Float64),
            CellValue::String(_) => Some(ColumnType::String),
            CellValue::DateTime(_) => Some(ColumnType::DateTime),
        }
    }

    fn merge(self, other: Self) -> Self {
        use ColumnType::*;
        match (self, other) {
            (Null, t) | (t, Null) => t,
            (a, b) if a == b => a,
            (Int64, Float64) | (Float64, Int64) => Float64,
            _ => Mixed,
        }
    }

    /// Infer the type of a sequence of values.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        values
            .into_iter()
            .filter_map(ColumnType::of)
            .fold(ColumnType::Null, ColumnType::merge)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
            ColumnType::DateTime => "datetime",
            ColumnType::Mixed => "mixed",
            ColumnType::Null => "null",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column – a named sequence of cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    /// A column mixing integers and floats is promoted to floats throughout.
    pub fn new(name: impl Into<String>, mut values: Vec<CellValue>) -> Self {
        if ColumnType::infer(&values) == ColumnType::Float64 {
            for value in &mut values {
                if let CellValue::Integer(i) = *value {
                    *value = CellValue::Float(i as f64);
                }
            }
        }
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The first `n` values in row order; shorter when the column is.
    pub fn head(&self, n: usize) -> &[CellValue] {
        &self.values[..n.min(self.values.len())]
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn has_nulls(&self) -> bool {
        self.values.iter().any(CellValue::is_null)
    }

    /// Sorted distinct values, nulls excluded.
    pub fn unique_non_null(&self) -> BTreeSet<CellValue> {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::infer(&self.values)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table. Every column holds exactly `n_rows` values.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from whole columns, rejecting ragged input.
    pub fn new(columns: Vec<Column>) -> Result<Self, ShapeError> {
        let n_rows = columns.first().map_or(0, Column::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(ShapeError::LengthMismatch {
                column: bad.name.clone(),
                expected: n_rows,
                found: bad.len(),
            });
        }
        Ok(Self { columns, n_rows })
    }

    /// Build a dataset from row-major cells. Short rows are padded with nulls.
    pub fn from_rows(
        headers: Vec<String>,
        rows: impl IntoIterator<Item = Vec<CellValue>>,
    ) -> Result<Self, ShapeError> {
        let width = headers.len();
        let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); width];

        for (row_no, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ShapeError::RowTooWide {
                    row: row_no,
                    expected: width,
                    found: row.len(),
                });
            }
            row.resize(width, CellValue::Null);
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }

        Self::new(
            headers
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in their original order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First column with exactly this name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use CellValue::{Float, Integer, Null};

    #[test]
    fn numeric_values_sort_by_magnitude_across_int_and_float() {
        let mut values = vec![Float(2.5), Integer(3), Integer(1), Float(1.0)];
        values.sort();
        assert_eq!(values, vec![Integer(1), Float(1.0), Float(2.5), Integer(3)]);
    }

    #[test]
    fn int_float_comparison_is_exact_beyond_f64_precision() {
        let two_pow_53 = 9_007_199_254_740_992_i64;
        assert!(Integer(two_pow_53 + 1) > Float(two_pow_53 as f64));
        assert!(Float(two_pow_53 as f64) < Integer(two_pow_53 + 1));
        assert!(Integer(two_pow_53) < Float(two_pow_53 as f64));
        assert!(Integer(i64::MAX) < Float(9.3e18));
        assert!(Integer(i64::MIN) > Float(f64::NEG_INFINITY));
        assert!(Integer(1) < Float(1.5) && Integer(2) > Float(1.5));
        assert!(Integer(-2) < Float(-1.5) && Integer(-1) > Float(-1.5));
    }

    #[test]
    fn mixed_int_float_column_is_promoted_to_float() {
        let col = Column::new("year", vec![Integer(2001), Float(2001.0), Null, Integer(1999)]);
        assert_eq!(col.column_type(), ColumnType::Float64);
        assert_eq!(col.values, vec![Float(2001.0), Float(2001.0), Null, Float(1999.0)]);
        let unique: Vec<_> = col.unique_non_null().into_iter().collect();
        assert_eq!(unique, vec![Float(1999.0), Float(2001.0)]);

        let ints = Column::new("year", vec![Integer(2001), Null]);
        assert_eq!(ints.values, vec![Integer(2001), Null]);
    }

    #[test]
    fn null_sorts_before_everything() {
        assert!(Null < CellValue::Bool(false));
        assert!(Null < Integer(i64::MIN));
        assert!(Integer(5) < CellValue::String("0".into()));
    }

    #[test]
    fn display_keeps_float_marker_for_integral_floats() {
        assert_eq!(Float(2001.0).to_string(), "2001.0");
        assert_eq!(Float(0.25).to_string(), "0.25");
        assert_eq!(Integer(2001).to_string(), "2001");
        assert_eq!(Null.to_string(), "NaN");
    }

    #[test]
    fn from_f64_maps_nan_to_null() {
        assert_eq!(CellValue::from_f64(f64::NAN), Null);
        assert_eq!(CellValue::from_f64(1.5), Float(1.5));
    }

    #[test]
    fn column_type_inference() {
        assert_eq!(ColumnType::infer(&[Integer(1), Null, Integer(2)]), ColumnType::Int64);
        assert_eq!(ColumnType::infer(&[Integer(1), Float(2.5)]), ColumnType::Float64);
        assert_eq!(
            ColumnType::infer(&[Integer(1), CellValue::String("x".into())]),
            ColumnType::Mixed
        );
        assert_eq!(ColumnType::infer(&[Null, Null]), ColumnType::Null);
        assert_eq!(ColumnType::infer(&Vec::<CellValue>::new()), ColumnType::Null);
        assert_eq!(ColumnType::Float64.to_string(), "float64");
    }

    #[test]
    fn head_is_truncated_not_padded() {
        let col = Column::new("year", vec![Integer(1), Integer(2), Integer(3)]);
        assert_eq!(col.head(5).len(), 3);
        assert_eq!(col.head(2), &[Integer(1), Integer(2)]);
    }

    #[test]
    fn null_statistics() {
        let col = Column::new("year", vec![Integer(2001), Integer(2001), Null, Integer(1999)]);
        assert_eq!(col.null_count(), 1);
        assert!(col.has_nulls());
        let unique: Vec<_> = col.unique_non_null().into_iter().collect();
        assert_eq!(unique, vec![Integer(1999), Integer(2001)]);
    }

    #[test]
    fn dataset_rejects_unequal_columns() {
        let err = Dataset::new(vec![
            Column::new("a", vec![Integer(1), Integer(2)]),
            Column::new("b", vec![Integer(1)]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::LengthMismatch { ref column, expected: 2, found: 1 } if column == "b"
        ));
    }

    #[test]
    fn from_rows_pads_short_rows_and_rejects_wide_ones() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Integer(1), Integer(2)], vec![Integer(3)]],
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column("b").unwrap().values, vec![Integer(2), Null]);

        let err = Dataset::from_rows(vec!["a".into()], vec![vec![Integer(1), Integer(2)]]);
        assert!(matches!(err, Err(ShapeError::RowTooWide { row: 0, .. })));
    }

    #[test]
    fn column_lookup_is_exact() {
        let ds = Dataset::new(vec![Column::new("Year", vec![])]).unwrap();
        assert!(ds.column("Year").is_some());
        assert!(ds.column("year").is_none());
        assert_eq!(ds.column_names(), vec!["Year"]);
        assert!(ds.is_empty());
    }
}
