//! Unified source loading entrypoint.
//!
//! Most callers should use [`load_source`], which reads a file into a
//! [`crate::types::TabularSource`].
//!
//! - If [`LoadOptions::format`] is `None`, the format is inferred from the file extension.
//! - Workbooks read [`LoadOptions::sheet`], or their first sheet when it is `None`.

use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::types::TabularSource;

use super::csv;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Infer the format of `path` from its extension.
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat {
                message: format!("cannot infer format: path has no extension ({})", path.display()),
            })?;

        Self::from_extension(ext).ok_or_else(|| ExportError::UnsupportedFormat {
            message: format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ),
        })
    }
}

/// Options controlling [`load_source`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
    /// Worksheet to read. Ignored for CSV.
    pub sheet: Option<String>,
}

/// Load a source file with both metadata rows intact.
///
/// ```no_run
/// use table_exporter::ingestion::{load_source, LoadOptions};
///
/// # fn main() -> Result<(), table_exporter::ExportError> {
/// let source = load_source("data/Item.xlsx", &LoadOptions::default())?;
/// println!("rows={}", source.data_row_count());
/// # Ok(())
/// # }
/// ```
pub fn load_source(path: impl AsRef<Path>, options: &LoadOptions) -> ExportResult<TabularSource> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => SourceFormat::from_path(path)?,
    };

    match format {
        SourceFormat::Csv => csv::load_csv_source(path),
        SourceFormat::Excel => load_excel_dispatch(path, options.sheet.as_deref()),
    }
}

fn load_excel_dispatch(path: &Path, sheet: Option<&str>) -> ExportResult<TabularSource> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, sheet);

    #[cfg(feature = "excel")]
    {
        super::excel::load_excel_source(path, sheet)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(ExportError::UnsupportedFormat {
            message: "excel sources not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
