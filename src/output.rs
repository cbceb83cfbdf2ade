//! Artifact persistence.
//!
//! Each mapping produces two files under its export directory:
//! `csv/<name>.csv` (the filtered dataset) and `cs/<name>.cs` (the class source).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ExportResult;
use crate::mapping::MappingSpec;
use crate::types::DataSet;

/// Paths written for one mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub csv_path: PathBuf,
    pub cs_path: PathBuf,
}

/// Write `dataset` as CSV: a header row with the column names, then one record per row.
///
/// Nulls become empty fields and booleans are written as `True`/`False`.
pub fn write_dataset_csv<W: Write>(dataset: &DataSet, writer: W) -> ExportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `dataset` to `path`, creating parent directories as needed.
pub fn write_dataset_csv_to_path(dataset: &DataSet, path: impl AsRef<Path>) -> ExportResult<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    write_dataset_csv(dataset, fs::File::create(path)?)
}

/// Write generated source to `path`, creating parent directories as needed.
pub fn write_code(code: &str, path: impl AsRef<Path>) -> ExportResult<()> {
    let path = path.as_ref();
    create_parent_dir(path)?;
    fs::write(path, code)?;
    Ok(())
}

/// Write the class source of `spec` to `cs/<name>.cs`.
pub fn write_class(spec: &MappingSpec, code: &str) -> ExportResult<PathBuf> {
    let cs_path = spec.cs_output_path();
    write_code(code, &cs_path)?;
    info!(mapping = %spec.name, path = %cs_path.display(), "wrote class");
    Ok(cs_path)
}

/// Write the exported dataset of `spec` to `csv/<name>.csv`.
pub fn write_dataset(spec: &MappingSpec, dataset: &DataSet) -> ExportResult<PathBuf> {
    let csv_path = spec.csv_output_path();
    write_dataset_csv_to_path(dataset, &csv_path)?;
    info!(
        mapping = %spec.name,
        path = %csv_path.display(),
        rows = dataset.row_count(),
        "wrote csv"
    );
    Ok(csv_path)
}

fn create_parent_dir(path: &Path) -> ExportResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
