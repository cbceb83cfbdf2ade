#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{ExportError, ExportResult};
use crate::types::{TabularSource, Value};

/// Load one worksheet of an Excel document (`.xlsx`, `.xls`, `.ods`, etc.).
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Cells keep their absolute sheet position: leading empty rows and columns are
///   preserved as nulls, so row 0 is always the sheet's first row
/// - Cells are converted into [`Value`]s without any schema
pub fn load_excel_source(path: impl AsRef<Path>, sheet_name: Option<&str>) -> ExportResult<TabularSource> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ExportError::UnsupportedFormat {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    Ok(range_to_source(&range))
}

fn range_to_source(range: &Range<Data>) -> TabularSource {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<Value>> = (0..first_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut out = vec![Value::Null; first_col as usize];
        out.extend(row.iter().map(convert_cell));
        rows.push(out);
    }
    TabularSource::new(rows)
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::Utf8(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::DateTime(_) => Value::Utf8(c.to_string()),
    }
}
