//! Machine-readable run summary.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ExportResult;

use super::observer::{severity_for_error, BatchMetricsSnapshot, ExportSeverity};
use super::MappingOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Exported,
    Checked,
    Failed,
}

/// Report entry for one mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingReport {
    pub name: String,
    pub config: PathBuf,
    pub status: MappingStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cs_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<ExportSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&MappingOutcome> for MappingReport {
    fn from(outcome: &MappingOutcome) -> Self {
        let mut report = MappingReport {
            name: outcome.name.clone(),
            config: outcome.config_path.clone(),
            status: MappingStatus::Failed,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
            input_rows: None,
            output_rows: None,
            csv_path: None,
            cs_path: None,
            severity: None,
            error: None,
        };

        match &outcome.result {
            Ok(summary) => {
                report.input_rows = Some(summary.input_rows);
                report.output_rows = Some(summary.output_rows);
                match &summary.written {
                    Some(written) => {
                        report.status = MappingStatus::Exported;
                        report.csv_path = Some(written.csv_path.clone());
                        report.cs_path = Some(written.cs_path.clone());
                    }
                    None => report.status = MappingStatus::Checked,
                }
            }
            Err(e) => {
                report.severity = Some(severity_for_error(e));
                report.error = Some(e.to_string());
            }
        }
        report
    }
}

/// Summary of a whole batch, serializable as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub metrics: BatchMetricsSnapshot,
    pub mappings: Vec<MappingReport>,
}

impl BatchReport {
    pub fn new(outcomes: &[MappingOutcome], metrics: BatchMetricsSnapshot) -> Self {
        let mappings: Vec<MappingReport> = outcomes.iter().map(MappingReport::from).collect();
        let failed = mappings
            .iter()
            .filter(|m| m.status == MappingStatus::Failed)
            .count();
        Self {
            succeeded: mappings.len() - failed,
            failed,
            metrics,
            mappings,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::from)?;
        Ok(())
    }
}
