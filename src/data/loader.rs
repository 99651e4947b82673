use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{LoadError, ShapeError};
use super::model::{CellValue, Column, Dataset};

/// Extensions read through the workbook reader.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Text cells treated as missing values in CSV input.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "#N/A"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first sheet, or `sheet` when given
/// * `.csv`     – header row, then records
/// * `.parquet` – any flat schema
/// * `.json`    – `[{ "col": value, ... }, ...]`
///
/// `sheet` only applies to workbooks; other formats ignore it.
pub fn load_file(path: &Path, sheet: Option<&str>) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let is_workbook = WORKBOOK_EXTENSIONS.contains(&ext.as_str());
    if let (false, Some(name)) = (is_workbook, sheet) {
        warn!("Ignoring sheet '{name}': .{ext} files have no sheets");
    }

    let dataset = match ext.as_str() {
        _ if is_workbook => load_workbook(path, sheet),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => Err(LoadError::Unsupported {
            extension: other.to_string(),
        }),
    }?;

    info!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    if dataset.is_empty() {
        warn!("{} contains no data rows", path.display());
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

/// The first row of the sheet is the header; the rest are data rows.
fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset, LoadError> {
    // Read the whole file up front so the handle is released before parsing.
    let bytes = std::fs::read(path).map_err(|e| LoadError::file_access(path, e))?;
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| LoadError::parse(path, e))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::parse(path, "workbook has no sheets"))?,
    };
    debug!("Reading sheet '{sheet_name}'");

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::parse(path, e))?;
    dataset_from_range(&range).map_err(|e| LoadError::parse(path, e))
}

/// Convert a sheet's used range into a [`Dataset`].
pub fn dataset_from_range(range: &Range<Data>) -> Result<Dataset, ShapeError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Dataset::new(Vec::new());
    };

    let headers = normalize_headers(header.iter().map(|cell| match cell_from_data(cell) {
        CellValue::Null => None,
        CellValue::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }));
    // Blank rows inside the sheet are data rows full of nulls; only trailing ones are dropped.
    let mut body: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    while body.last().is_some_and(|row| is_blank(row)) {
        body.pop();
    }

    Dataset::from_rows(headers, body)
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => workbook_number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => CellValue::DateTime(d.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => workbook_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// Workbooks store every number as a float; integral ones become integers.
fn workbook_number(f: f64) -> CellValue {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && f.abs() < I64_BOUND {
        CellValue::Integer(f as i64)
    } else {
        CellValue::from_f64(f)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, then one record per row.
/// Cell types are guessed per field; see [`guess_cell_type`].
fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::file_access(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = normalize_headers(
        reader
            .headers()
            .map_err(|e| LoadError::parse(path, e))?
            .iter()
            .map(|h| (!h.is_empty()).then(|| h.to_string())),
    );

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::parse(path, format!("CSV row {row_no}: {e}")))?;
        let row: Vec<CellValue> = record.iter().map(guess_cell_type).collect();
        if !is_blank(&row) {
            rows.push(row);
        }
    }
    debug!("Read {} CSV records", rows.len());

    Dataset::from_rows(headers, rows).map_err(|e| LoadError::parse(path, e))
}

fn guess_cell_type(s: &str) -> CellValue {
    if NA_MARKERS.contains(&s) {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::from_f64(f);
    }
    match s {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load every column of a Parquet file, in schema order.
fn load_parquet(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::file_access(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::parse(path, e))?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| LoadError::parse(path, e))?;

    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::parse(path, e))?;
        for (values, array) in columns.iter_mut().zip(batch.columns()) {
            values.extend(arrow_cells(array).map_err(|e| LoadError::parse(path, e))?);
        }
    }

    Dataset::new(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
    .map_err(|e| LoadError::parse(path, e))
}

/// Convert one Arrow column into cells.
fn arrow_cells(array: &ArrayRef) -> Result<Vec<CellValue>, ArrowError> {
    let dt = array.data_type();

    let cells = if dt.is_integer() {
        let ints = cast(array.as_ref(), &DataType::Int64)?;
        ints.as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Integer))
            .collect()
    } else if dt.is_floating() {
        let floats = cast(array.as_ref(), &DataType::Float64)?;
        floats
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::from_f64))
            .collect()
    } else if *dt == DataType::Boolean {
        array
            .as_boolean()
            .iter()
            .map(|v| v.map_or(CellValue::Null, CellValue::Bool))
            .collect()
    } else if dt.is_temporal()
        || matches!(dt, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
    {
        let temporal = dt.is_temporal();
        let text = cast(array.as_ref(), &DataType::Utf8)?;
        text.as_string::<i32>()
            .iter()
            .map(|v| match v {
                None => CellValue::Null,
                Some(s) if temporal => CellValue::DateTime(s.to_string()),
                Some(s) => CellValue::String(s.to_string()),
            })
            .collect()
    } else {
        // Nested and other exotic types are kept as their display text.
        let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
        (0..array.len())
            .map(|row| {
                if array.is_null(row) {
                    CellValue::Null
                } else {
                    CellValue::String(formatter.value(row).to_string())
                }
            })
            .collect()
    };

    Ok(cells)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "year": 2001, "region": "north" },
///   { "year": null, "region": "south" }
/// ]
/// ```
///
/// Columns appear in order of first appearance; missing keys are null.
fn load_json(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::file_access(path, e))?;
    let root: JsonValue = serde_json::from_slice(&bytes).map_err(|e| LoadError::parse(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::parse(path, "expected a top-level JSON array"))?;

    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<Vec<CellValue>> = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::parse(path, format!("row {i} is not a JSON object")))?;

        for (key, val) in obj {
            let col = *index.entry(key.clone()).or_insert_with(|| {
                names.push(key.clone());
                columns.push(vec![CellValue::Null; i]);
                names.len() - 1
            });
            columns[col].push(json_to_cell(val));
        }
        for col in &mut columns {
            col.resize(i + 1, CellValue::Null);
        }
    }

    Dataset::new(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
    .map_err(|e| LoadError::parse(path, e))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::from_f64(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Name empty headers `Unnamed: {i}` and suffix repeats with `.1`, `.2`, ...
fn normalize_headers(raw: impl IntoIterator<Item = Option<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, name) in raw.into_iter().enumerate() {
        let base = name.unwrap_or_else(|| format!("Unnamed: {i}"));
        let mut candidate = base.clone();
        let mut suffix = 0;
        while out.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}.{suffix}");
        }
        out.push(candidate);
    }
    out
}

fn is_blank(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_null)
}
