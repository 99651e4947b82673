use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use super::model::{CellValue, Column, ColumnType, Dataset};

/// Header of the leading row-number column.
pub const INDEX_COLUMN: &str = "#";

// ---------------------------------------------------------------------------
// Dataset → Arrow
// ---------------------------------------------------------------------------

/// Build a [`RecordBatch`] from the first `n` rows, prefixed with a row-number
/// column. Each column keeps the Arrow type matching its [`ColumnType`]; mixed
/// columns fall back to text.
pub fn head_batch(dataset: &Dataset, n: usize) -> Result<RecordBatch, ArrowError> {
    let rows = n.min(dataset.len());

    let mut fields = vec![Field::new(INDEX_COLUMN, DataType::UInt64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(UInt64Array::from_iter_values(0..rows as u64))];

    for column in dataset.columns() {
        let (data_type, array) = column_to_array(column, rows);
        fields.push(Field::new(column.name.as_str(), data_type, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}

fn column_to_array(column: &Column, rows: usize) -> (DataType, ArrayRef) {
    let values = column.head(rows);
    match column.column_type() {
        ColumnType::Int64 => (
            DataType::Int64,
            Arc::new(Int64Array::from_iter(values.iter().map(|v| match v {
                CellValue::Integer(i) => Some(*i),
                _ => None,
            }))),
        ),
        ColumnType::Float64 => (
            DataType::Float64,
            Arc::new(Float64Array::from_iter(values.iter().map(CellValue::as_f64))),
        ),
        ColumnType::Bool => (
            DataType::Boolean,
            Arc::new(BooleanArray::from_iter(values.iter().map(|v| match v {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            }))),
        ),
        ColumnType::String | ColumnType::DateTime | ColumnType::Mixed | ColumnType::Null => (
            DataType::Utf8,
            Arc::new(StringArray::from_iter(
                values.iter().map(|v| (!v.is_null()).then(|| v.to_string())),
            )),
        ),
    }
}

// ---------------------------------------------------------------------------
// Pretty table
// ---------------------------------------------------------------------------

/// Render the first `n` rows as a boxed text table. Nulls show as empty cells.
pub fn head_table(dataset: &Dataset, n: usize) -> Result<String, ArrowError> {
    let batch = head_batch(dataset, n)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}
