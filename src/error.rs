use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Error type returned by loading, processing and writing functions.
///
/// A single enum is shared by the core (column resolution, filtering) and the adapters
/// around it (configuration, ingestion, artifact output).
#[derive(Debug, Error)]
pub enum ExportError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook read error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV read or write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration file could not be parsed.
    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A mapping entry is well-formed YAML but violates a mapping invariant.
    #[error("invalid mapping '{mapping}': {message}")]
    InvalidMapping { mapping: String, message: String },

    /// Source and target column lists have different lengths.
    #[error("column count mismatch: {sources} source column(s) but {targets} target column(s)")]
    ColumnCountMismatch { sources: usize, targets: usize },

    /// One or more requested source columns are not present in the header row.
    #[error("missing source column(s) {columns:?}. headers={available:?}")]
    MissingColumns {
        columns: Vec<String>,
        available: Vec<String>,
    },

    /// A filter expression could not be compiled or evaluated.
    #[error("filter on '{column}' failed: {message} (expression='{expression}')")]
    Filter {
        column: String,
        expression: String,
        message: String,
    },

    /// The input file type is not supported (or its feature is disabled).
    #[error("unsupported source: {message}")]
    UnsupportedFormat { message: String },
}
