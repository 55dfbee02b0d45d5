//! Decoding raw dataset bytes into a [`Dataset`].
//!
//! Supports plain CSV, ZIP archives holding a CSV, JSON record arrays and
//! directories containing a CSV somewhere below them.

use crate::models::{Dataset, Value};
use crate::source::buffer_capacity;
use crate::source::error::{DatasetError, Result};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Inferred type of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Load a dataset from a local file or directory.
pub fn load_path(path: &Path) -> Result<Dataset> {
    let file = if path.is_dir() {
        find_csv_in_dir(path)?
    } else {
        path.to_path_buf()
    };

    debug!("Reading dataset file: {}", file.display());
    let bytes = std::fs::read(&file).map_err(|source| DatasetError::Io {
        path: file.clone(),
        source,
    })?;

    decode_bytes(&bytes, &file.to_string_lossy())
}

/// First `.csv` file under `dir`, walking entries in sorted order.
fn find_csv_in_dir(dir: &Path) -> Result<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| has_extension(&path.to_string_lossy(), ".csv"))
        .ok_or_else(|| DatasetError::NoCsvInArchive(dir.display().to_string()))
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.to_lowercase().ends_with(ext)
}

/// Decode bytes, sniffing ZIP by magic number and JSON by name or content.
pub fn decode_bytes(bytes: &[u8], name_hint: &str) -> Result<Dataset> {
    if bytes.starts_with(ZIP_MAGIC) {
        return decode_zip(bytes, name_hint);
    }

    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if has_extension(name_hint, ".json") || first == Some(&b'[') {
        return decode_json_records(bytes);
    }

    decode_csv(bytes)
}

/// Decode the first CSV entry of a ZIP archive.
pub fn decode_zip(bytes: &[u8], name_hint: &str) -> Result<Dataset> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx)?;
        let name = entry.name().to_string();
        if !has_extension(&name, ".csv") {
            continue;
        }

        info!("Using CSV entry {} from archive", name);
        let mut data = Vec::with_capacity(buffer_capacity(entry.size()));
        entry.read_to_end(&mut data).map_err(|source| DatasetError::Io {
            path: PathBuf::from(&name),
            source,
        })?;
        return decode_csv(&data);
    }

    Err(DatasetError::NoCsvInArchive(name_hint.to_string()))
}

/// Decode CSV with a header row.
///
/// Empty fields become null, short rows are padded, invalid UTF-8 is
/// replaced lossily, and each column gets a single inferred type.
pub fn decode_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .to_string()
        })
        .collect();

    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let mut row: Vec<Option<String>> = record
            .iter()
            .take(columns.len())
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(field).into_owned())
                }
            })
            .collect();
        row.resize(columns.len(), None);
        raw.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|col| infer_kind(raw.iter().filter_map(|row| row[col].as_deref())))
        .collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(field, kind)| convert(field, *kind))
                .collect()
        })
        .collect();

    debug!("Decoded CSV with column kinds {:?}", kinds);
    Ok(Dataset::new(columns, rows))
}

fn infer_kind<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnKind {
    let (mut int, mut float, mut boolean, mut seen) = (true, true, true, false);

    for field in fields {
        let field = field.trim();
        seen = true;
        int = int && field.parse::<i64>().is_ok();
        float = float && field.parse::<f64>().is_ok();
        boolean = boolean && parse_bool(field).is_some();
        if !(int || float || boolean) {
            return ColumnKind::Text;
        }
    }

    match (seen, int, float, boolean) {
        (false, ..) => ColumnKind::Text,
        (_, true, ..) => ColumnKind::Int,
        (_, _, true, _) => ColumnKind::Float,
        (_, _, _, true) => ColumnKind::Bool,
        _ => ColumnKind::Text,
    }
}

fn parse_bool(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn convert(field: Option<String>, kind: ColumnKind) -> Value {
    let Some(field) = field else {
        return Value::Null;
    };

    let parsed = match kind {
        ColumnKind::Int => field.trim().parse().ok().map(Value::Int),
        ColumnKind::Float => field.trim().parse().ok().map(Value::Float),
        ColumnKind::Bool => parse_bool(field.trim()).map(Value::Bool),
        ColumnKind::Text => None,
    };

    parsed.unwrap_or(Value::Text(field))
}

/// Decode a JSON array of record objects.
///
/// Columns follow first-seen key order across records; missing keys are null.
pub fn decode_json_records(bytes: &[u8]) -> Result<Dataset> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(bytes)?;

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.get(c).map(Value::from).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}
