use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use calamine::{Data, Ods, Reader, Xls, Xlsb, Xlsx};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// Where a table comes from: a file on disk (the configured fallback, or a
/// file picked by the user) or bytes already in memory (an upload).
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Path(PathBuf),
    Upload { file_name: String, bytes: Vec<u8> },
}

impl DataSource {
    /// Human-readable name used in messages.
    pub fn display_name(&self) -> String {
        match self {
            DataSource::Path(p) => p.display().to_string(),
            DataSource::Upload { file_name, .. } => file_name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw table from any source.
pub fn load(source: &DataSource) -> Result<RawTable, LoadError> {
    let table = match source {
        DataSource::Path(path) => load_file(path)?,
        DataSource::Upload { file_name, bytes } => load_bytes(file_name, bytes.clone())?,
    };
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.headers,
        source.display_name()
    );
    Ok(table)
}

/// Load a table from a file on disk. Dispatch by extension.
pub fn load_file(path: &Path) -> Result<RawTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::read(&path.display().to_string(), e),
    })?;
    let name = path.display().to_string();
    load_bytes(&name, bytes)
}

/// Load a table from in-memory file content, using `file_name` for the
/// extension.
///
/// Supported formats:
/// * `.csv`                             – header row, ISO-8859-1 text
/// * `.xlsx` / `.xlsm` / `.xls` / `.xlsb` / `.ods` – first worksheet, header row
/// * `.json`                            – `[{ "Nombre": ..., ... }, ...]`
/// * `.parquet`                         – flat columns, one per field
pub fn load_bytes(file_name: &str, bytes: Vec<u8>) -> Result<RawTable, LoadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(file_name, &bytes),
        "xlsx" | "xlsm" => first_sheet(Xlsx::new(Cursor::new(bytes)), file_name),
        "xls" => first_sheet(Xls::new(Cursor::new(bytes)), file_name),
        "xlsb" => first_sheet(Xlsb::new(Cursor::new(bytes)), file_name),
        "ods" => first_sheet(Ods::new(Cursor::new(bytes)), file_name),
        "json" => load_json(file_name, &bytes),
        "parquet" | "pq" => load_parquet(file_name, bytes),
        other => Err(LoadError::Unsupported {
            extension: other.to_string(),
        }),
    }
}

/// Pandas-style name for a column without a header.
fn unnamed(idx: usize) -> String {
    format!("Unnamed: {idx}")
}

/// Pad or cut a row to the header width; `None` if every cell is empty.
fn normalize_row(mut row: Vec<CellValue>, width: usize) -> Option<Vec<CellValue>> {
    row.resize(width, CellValue::Null);
    if row.iter().all(CellValue::is_null) {
        None
    } else {
        Some(row)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Decode ISO-8859-1: every byte is the code point of the same value.
/// A leading UTF-8 byte-order mark is dropped first.
pub fn decode_latin1(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn load_csv(source_name: &str, bytes: &[u8]) -> Result<RawTable, LoadError> {
    let text = decode_latin1(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::read(source_name, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                unnamed(i)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| LoadError::read(source_name, format!("row {row_no}: {e}")))?;
        let row: Vec<CellValue> = record.iter().map(|v| CellValue::infer(v.trim())).collect();
        rows.extend(normalize_row(row, headers.len()));
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet of any calamine workbook. The first row is the
/// header.
fn first_sheet<RS, R>(
    workbook: Result<R, R::Error>,
    source_name: &str,
) -> Result<RawTable, LoadError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let mut workbook = workbook.map_err(|e| LoadError::read(source_name, e))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::read(source_name, "workbook contains no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| LoadError::read(source_name, format!("sheet '{sheet_name}': {e}")))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, d)| spreadsheet_cell(d).as_label().unwrap_or_else(|| unnamed(i)))
            .collect(),
        None => return Ok(RawTable::default()),
    };

    let rows = iter
        .filter_map(|r| normalize_row(r.iter().map(spreadsheet_cell).collect(), headers.len()))
        .collect();

    Ok(RawTable { headers, rows })
}

fn spreadsheet_cell(d: &Data) -> CellValue {
    match d {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns appear in
/// the order they are first seen.
fn load_json(source_name: &str, bytes: &[u8]) -> Result<RawTable, LoadError> {
    let root: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| LoadError::read(source_name, e))?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::read(source_name, "expected top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::read(source_name, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| {
            let obj = rec.as_object()?;
            let row = headers
                .iter()
                .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                .collect();
            normalize_row(row, headers.len())
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.is_empty() => CellValue::Null,
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
// Parquet loader
// ---------------------------------------------------------------------------

/// Flat Parquet file (`df.to_parquet()`), one column per field.
fn load_parquet(source_name: &str, bytes: Vec<u8>) -> Result<RawTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes))
        .map_err(|e| LoadError::read(source_name, e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| LoadError::read(source_name, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::read(source_name, e))?;
        for row in 0..batch.num_rows() {
            let cells = batch.columns().iter().map(|col| arrow_cell(col, row)).collect();
            rows.extend(normalize_row(cells, headers.len()));
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::Text(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => arrow::util::display::array_value_to_string(col.as_ref(), row)
            .ok()
            .map(CellValue::Text),
    };
    value.unwrap_or(CellValue::Null)
}
