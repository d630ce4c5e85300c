use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float64Type, Int64Type};
use bytes::Bytes;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::Rng;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable, SalesTable};
use super::repair::build_table;
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a source file and repair it into a complete [`SalesTable`].
pub fn load_file<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Result<SalesTable, LoadError> {
    let format = SourceFormat::of(path)?;
    let bytes = read_bytes(path)?;
    load_bytes(format, path, bytes, rng)
}

/// Parse contents that were already read from `path` and repair them into a
/// [`SalesTable`]. The file is not touched again; `path` only labels logs.
pub fn load_bytes<R: Rng + ?Sized>(
    format: SourceFormat,
    path: &Path,
    bytes: Vec<u8>,
    rng: &mut R,
) -> Result<SalesTable, LoadError> {
    let raw = parse_source(format, bytes)?;
    info!(
        "read {} rows x {} columns from {}",
        raw.len(),
        raw.column_names.len(),
        path.display()
    );
    Ok(build_table(raw, rng))
}

/// Read a source file into a [`RawTable`].
pub fn read_source(path: &Path) -> Result<RawTable, LoadError> {
    let format = SourceFormat::of(path)?;
    parse_source(format, read_bytes(path)?)
}

/// Whole file contents; a missing file maps to [`LoadError::NotFound`].
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|e| LoadError::io(path, e))
}

/// Source layouts, chosen by file extension.
///
/// * `.csv`     – header row, one sales observation per line
/// * `.parquet` – flat columns of any primitive type (recommended for large exports)
/// * `.json`    – `[{ "Date": "...", "Units Sold": 12, ... }, ...]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
    Json,
}

impl SourceFormat {
    pub fn of(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            "json" => Ok(Self::Json),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Parse file contents into a [`RawTable`].
pub fn parse_source(format: SourceFormat, bytes: Vec<u8>) -> Result<RawTable, LoadError> {
    match format {
        SourceFormat::Csv => parse_csv(&bytes),
        SourceFormat::Parquet => parse_parquet(Bytes::from(bytes)),
        SourceFormat::Json => parse_json(&bytes),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row is a record.
/// Cells are typed by guessing (see [`CellValue::from_text`]).
fn parse_csv(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw = RawTable::new(headers);
    for record in reader.records() {
        let record = record?;
        raw.push_row(record.iter().map(CellValue::from_text).collect());
    }
    Ok(raw)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')` layout.
/// The column set is the union of keys in first-appearance order; keys a
/// record lacks become nulls.
fn parse_json(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".into()))?;

    let mut column_names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
    }

    let mut raw = RawTable::new(column_names.clone());
    for rec in records {
        // Checked above.
        let Some(obj) = rec.as_object() else { continue };
        let cells = column_names
            .iter()
            .map(|name| obj.get(name).map(json_to_cell).unwrap_or(CellValue::Null))
            .collect();
        raw.push_row(cells);
    }
    Ok(raw)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Every column is read; strings, integers, floats,
/// booleans, dates and timestamps are recognised, anything else is rendered
/// as text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn parse_parquet(bytes: Bytes) -> Result<RawTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut raw = RawTable::new(column_names);
    for batch in reader {
        let batch = batch?;
        let columns = batch
            .columns()
            .iter()
            .map(normalize_array)
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            raw.push_row(columns.iter().map(|col| cell_at(col, row)).collect());
        }
    }
    Ok(raw)
}

// -- Parquet / Arrow helpers --

/// Cast a column to one of the five physical types [`cell_at`] understands.
fn normalize_array(col: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let target = match col.data_type() {
        DataType::Utf8 | DataType::Int64 | DataType::Float64 | DataType::Boolean | DataType::Date32 => {
            return Ok(col.clone());
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Decimal128(_, _) | DataType::Decimal256(_, _) => {
            DataType::Float64
        }
        DataType::Date64 | DataType::Timestamp(_, _) => DataType::Date32,
        other => {
            debug!("casting parquet column of type {other:?} to text");
            DataType::Utf8
        }
    };
    Ok(cast(col.as_ref(), &target)?)
}

fn cell_at(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        other => CellValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::data::model::Column;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_source(Path::new("/definitely/not/here/amazon.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_source(Path::new("sales.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn contents_are_parsed_without_touching_the_path() {
        let bytes = b"Date,Units Sold\n2022-01-01,7\n".to_vec();
        let table = load_bytes(
            SourceFormat::Csv,
            Path::new("/definitely/not/here/amazon.csv"),
            bytes,
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].units_sold, 7);
    }

    #[test]
    fn csv_cells_are_typed() {
        let file = write_temp(
            ".csv",
            "Date,Marketplace,Units Sold,Revenue\n2022-01-01,US,10,99.5\n2022-01-02,UK,,12\n",
        );
        let raw = read_source(file.path()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(
            raw.column(Column::UnitsSold).unwrap(),
            &[CellValue::Integer(10), CellValue::Null]
        );
        assert_eq!(
            raw.column(Column::Revenue).unwrap(),
            &[CellValue::Float(99.5), CellValue::Integer(12)]
        );
        assert_eq!(
            raw.column(Column::Marketplace).unwrap()[1],
            CellValue::Text("UK".into())
        );
    }

    #[test]
    fn json_records_union_their_keys() {
        let file = write_temp(
            ".json",
            r#"[{"ASIN": "B01", "Sessions": 10}, {"ASIN": "B02", "Revenue": 4.5}]"#,
        );
        let raw = read_source(file.path()).unwrap();
        assert_eq!(raw.column_names, vec!["ASIN", "Sessions", "Revenue"]);
        assert_eq!(raw.column(Column::Sessions).unwrap()[1], CellValue::Null);
        assert_eq!(raw.column(Column::Revenue).unwrap()[1], CellValue::Float(4.5));
    }

    #[test]
    fn json_must_be_an_array() {
        let file = write_temp(".json", r#"{"ASIN": "B01"}"#);
        assert!(matches!(read_source(file.path()), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn parquet_columns_are_normalized() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Date", DataType::Date32, true),
            Field::new("Sessions", DataType::Int32, false),
            Field::new("Revenue", DataType::Float64, false),
            Field::new("Category", DataType::Utf8, false),
        ]));
        let jan_1 = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Date32Array::from(vec![Some(Date32Type::from_naive_date(jan_1)), None])),
                Arc::new(Int32Array::from(vec![120, 80])),
                Arc::new(Float64Array::from(vec![10.5, 3.0])),
                Arc::new(StringArray::from(vec!["Books", "Apparel"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let raw = read_source(file.path()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(
            raw.column(Column::Date).unwrap(),
            &[CellValue::Date(jan_1), CellValue::Null]
        );
        assert_eq!(raw.column(Column::Sessions).unwrap()[0], CellValue::Integer(120));
        assert_eq!(raw.column(Column::Category).unwrap()[1], CellValue::Text("Apparel".into()));
    }
}
