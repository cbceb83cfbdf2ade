//! CSV source loading.
//!
//! A CSV source has the same layout as a spreadsheet: the first record holds declared
//! type names, the second the display names, and the rest are data rows. The reader is
//! therefore configured without a header row.

use std::path::Path;

use crate::error::ExportResult;
use crate::types::{TabularSource, Value};

/// Load a CSV file into a [`TabularSource`].
///
/// Records may have different lengths. Cell values are inferred per cell: empty -> null,
/// then integer, float, `true`/`false` (any case), otherwise text.
pub fn load_csv_source(path: impl AsRef<Path>) -> ExportResult<TabularSource> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing reader.
///
/// The reader should be built with `has_headers(false)`, otherwise the type row is
/// consumed as a header and lost.
pub fn load_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> ExportResult<TabularSource> {
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(infer_value).collect());
    }
    Ok(TabularSource::new(rows))
}

fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Value::Int64(v);
    }
    // `f64::from_str` also accepts words like "inf" and "NaN"; keep those as text.
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(v) = trimmed.parse::<f64>() {
            return Value::Float64(v);
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Utf8(raw.to_owned()),
    }
}
