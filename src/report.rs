use std::fmt;

use arrow::error::ArrowError;
use log::debug;

use crate::data::model::{CellValue, Column, ColumnType, Dataset};
use crate::data::preview::head_table;

/// Accepted year-column names, highest priority first. Matching is exact and
/// case-sensitive.
pub const YEAR_COLUMN_CANDIDATES: [&str; 3] = ["year", "Year", "YEAR"];

const YEAR_HEAD: usize = 5;
const PREVIEW_ROWS: usize = 3;

/// First candidate from [`YEAR_COLUMN_CANDIDATES`] present in `columns`.
pub fn find_year_column<S: AsRef<str>>(columns: &[S]) -> Option<&'static str> {
    YEAR_COLUMN_CANDIDATES
        .into_iter()
        .find(|candidate| columns.iter().any(|name| name.as_ref() == *candidate))
}

// ---------------------------------------------------------------------------
// Year-column statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearStats {
    pub column: String,
    /// Sorted distinct non-null values.
    pub unique: Vec<CellValue>,
    pub column_type: ColumnType,
    /// Up to the first five values, in row order.
    pub head: Vec<CellValue>,
    pub has_nulls: bool,
    pub null_count: usize,
}

impl YearStats {
    pub fn compute(column: &Column) -> Self {
        Self {
            column: column.name.clone(),
            unique: column.unique_non_null().into_iter().collect(),
            column_type: column.column_type(),
            head: column.head(YEAR_HEAD).to_vec(),
            has_nulls: column.has_nulls(),
            null_count: column.null_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything printed for one dataset.
#[derive(Debug, Clone)]
pub struct Report {
    pub columns: Vec<String>,
    pub year: Option<YearStats>,
    pub total_rows: usize,
    /// Rendered table of the first rows.
    pub preview: String,
}

impl Report {
    pub fn build(dataset: &Dataset) -> Result<Self, ArrowError> {
        let columns: Vec<String> = dataset
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let year = find_year_column(columns.as_slice())
            .and_then(|name| dataset.column(name))
            .map(YearStats::compute);
        match &year {
            Some(stats) => debug!("Using '{}' as the year column", stats.column),
            None => debug!("No year column among {} columns", columns.len()),
        }

        Ok(Self {
            columns,
            year,
            total_rows: dataset.len(),
            preview: head_table(dataset, PREVIEW_ROWS)?,
        })
    }
}

/// `[a, b, "c"]`: text values quoted, the rest bare.
struct ValueList<'a>(&'a [CellValue]);

impl fmt::Display for ValueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                CellValue::String(s) | CellValue::DateTime(s) => write!(f, "{s:?}")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("]")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Columns in spreadsheet:")?;
        writeln!(f, "{:?}", self.columns)?;
        writeln!(f)?;

        match &self.year {
            Some(stats) => {
                writeln!(f, "Year column: {}", stats.column)?;
                writeln!(f, "Unique years: {}", ValueList(&stats.unique))?;
                writeln!(f, "Year value types: {}", stats.column_type)?;
                writeln!(f, "First 5 year values: {}", ValueList(&stats.head))?;
                writeln!(f, "Any null years: {}", stats.has_nulls)?;
                writeln!(f, "Null year count: {}", stats.null_count)?;
            }
            None => writeln!(f, "No year column found!")?,
        }

        writeln!(f)?;
        writeln!(f, "Total rows: {}", self.total_rows)?;
        writeln!(f)?;
        writeln!(f, "First {PREVIEW_ROWS} rows:")?;
        writeln!(f, "{}", self.preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use CellValue::{Integer, Null};

    fn dataset(columns: Vec<Column>) -> Dataset {
        Dataset::new(columns).unwrap()
    }

    fn ints(values: &[i64]) -> Vec<CellValue> {
        values.iter().copied().map(Integer).collect()
    }

    #[test]
    fn finds_lowercase_year() {
        assert_eq!(find_year_column(&["A", "year", "C"]), Some("year"));
    }

    #[test]
    fn year_candidates_follow_priority_order() {
        assert_eq!(find_year_column(&["A", "Year", "YEAR"]), Some("Year"));
        assert_eq!(find_year_column(&["YEAR", "Year", "year"]), Some("year"));
        assert_eq!(find_year_column(&["YEAR"]), Some("YEAR"));
    }

    #[test]
    fn year_detection_is_case_sensitive() {
        assert_eq!(find_year_column(&["A", "B"]), None);
        assert_eq!(find_year_column(&["yEaR", "years", " year"]), None);
        assert_eq!(find_year_column::<&str>(&[]), None);
    }

    #[test]
    fn year_statistics_exclude_nulls_from_unique() {
        let col = Column::new("year", vec![Integer(2001), Integer(2001), Null, Integer(1999)]);
        let stats = YearStats::compute(&col);

        assert_eq!(stats.unique, ints(&[1999, 2001]));
        assert_eq!(stats.null_count, 1);
        assert!(stats.has_nulls);
        assert_eq!(stats.column_type, ColumnType::Int64);
        assert_eq!(stats.head, vec![Integer(2001), Integer(2001), Null, Integer(1999)]);
    }

    #[test]
    fn short_year_column_head_is_not_padded() {
        let stats = YearStats::compute(&Column::new("Year", ints(&[2020, 2021, 2022])));
        assert_eq!(stats.head, ints(&[2020, 2021, 2022]));
        assert!(!stats.has_nulls);
        assert_eq!(stats.null_count, 0);
    }

    #[test]
    fn head_keeps_first_five_in_row_order() {
        let stats = YearStats::compute(&Column::new("year", ints(&[7, 6, 5, 4, 3, 2, 1])));
        assert_eq!(stats.head, ints(&[7, 6, 5, 4, 3]));
        assert_eq!(stats.unique, ints(&[1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn report_with_year_column() {
        let ds = dataset(vec![
            Column::new("A", ints(&[1, 2, 3, 4])),
            Column::new("year", vec![Integer(2001), Integer(2001), Null, Integer(1999)]),
            Column::new(
                "C",
                ["w", "x", "y", "z"].iter().map(|s| CellValue::String(s.to_string())).collect(),
            ),
        ]);
        let report = Report::build(&ds).unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.year.as_ref().map(|y| y.column.as_str()), Some("year"));

        let text = report.to_string();
        assert!(text.starts_with("Columns in spreadsheet:\n[\"A\", \"year\", \"C\"]\n"));
        assert!(text.contains("Year column: year\n"));
        assert!(text.contains("Unique years: [1999, 2001]\n"));
        assert!(text.contains("Year value types: int64\n"));
        assert!(text.contains("First 5 year values: [2001, 2001, NaN, 1999]\n"));
        assert!(text.contains("Any null years: true\n"));
        assert!(text.contains("Null year count: 1\n"));
        assert!(text.contains("Total rows: 4\n"));
        assert!(text.contains("First 3 rows:\n+"));
        assert!(!text.contains("No year column found!"));
    }

    #[test]
    fn report_without_year_column_skips_statistics() {
        let ds = dataset(vec![
            Column::new("A", ints(&[1, 2])),
            Column::new("B", ints(&[3, 4])),
        ]);
        let report = Report::build(&ds).unwrap();

        assert!(report.year.is_none());
        let text = report.to_string();
        assert!(text.contains("No year column found!\n"));
        assert!(!text.contains("Unique years"));
        assert!(!text.contains("Null year count"));
        assert!(text.contains("Total rows: 2\n"));
    }

    #[test]
    fn mixed_int_float_years_report_as_floats() {
        let col = Column::new(
            "year",
            vec![Integer(2001), CellValue::Float(2001.0), Integer(1999)],
        );
        let stats = YearStats::compute(&col);

        assert_eq!(stats.column_type, ColumnType::Float64);
        let ds = dataset(vec![col]);
        let text = Report::build(&ds).unwrap().to_string();
        assert!(text.contains("Unique years: [1999.0, 2001.0]\n"));
        assert!(text.contains("First 5 year values: [2001.0, 2001.0, 1999.0]\n"));
    }

    #[test]
    fn text_values_are_quoted_in_lists() {
        let values = vec![CellValue::String("2001".into()), Integer(1999), Null];
        assert_eq!(ValueList(&values).to_string(), "[\"2001\", 1999, NaN]");
        assert_eq!(ValueList(&[]).to_string(), "[]");
    }
}
