use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::ExportError;

/// Severity classification of a failed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportSeverity {
    /// The mapping or its source data is wrong; other mappings are unaffected.
    Error,
    /// Infrastructure failure (typically I/O).
    Critical,
}

impl fmt::Display for ExportSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportSeverity::Error => f.write_str("error"),
            ExportSeverity::Critical => f.write_str("critical"),
        }
    }
}

/// Classify an error for observers.
pub fn severity_for_error(e: &ExportError) -> ExportSeverity {
    match e {
        ExportError::Io(_) => ExportSeverity::Critical,
        ExportError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => ExportSeverity::Critical,
            _ => ExportSeverity::Error,
        },
        #[cfg(feature = "excel")]
        ExportError::Excel(calamine::Error::Io(_)) => ExportSeverity::Critical,
        _ => ExportSeverity::Error,
    }
}

/// Events emitted by the [`super::BatchRunner`].
#[derive(Debug, Clone)]
pub enum ExportEvent {
    BatchStarted {
        jobs: usize,
    },
    MappingStarted {
        name: String,
        source: PathBuf,
    },
    MappingExported {
        name: String,
        output_rows: usize,
        elapsed: Duration,
        dry_run: bool,
    },
    MappingFailed {
        name: String,
        severity: ExportSeverity,
        error: String,
    },
    BatchFinished {
        elapsed: Duration,
        metrics: BatchMetricsSnapshot,
    },
}

/// Observer hook for batch events.
pub trait ExportObserver: Send + Sync {
    fn on_event(&self, event: &ExportEvent);
}

/// Forwards batch events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExportObserver for TracingObserver {
    fn on_event(&self, event: &ExportEvent) {
        match event {
            ExportEvent::BatchStarted { jobs } => info!(jobs, "starting export batch"),
            ExportEvent::MappingStarted { name, source } => {
                debug!(mapping = %name, source = %source.display(), "processing mapping")
            }
            ExportEvent::MappingExported {
                name,
                output_rows,
                elapsed,
                dry_run,
            } => info!(
                mapping = %name,
                rows = output_rows,
                elapsed_ms = elapsed.as_millis() as u64,
                dry_run,
                "exported mapping"
            ),
            ExportEvent::MappingFailed { name, severity, error } => {
                error!(mapping = %name, %severity, "mapping failed: {error}")
            }
            ExportEvent::BatchFinished { elapsed, metrics } => info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "export batch finished: {metrics}"
            ),
        }
    }
}

/// Real-time counters for a batch run.
///
/// The runner updates these while jobs execute; callers can snapshot them at any time.
pub struct BatchMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    mappings_started: AtomicU64,
    mappings_succeeded: AtomicU64,
    mappings_failed: AtomicU64,
    rows_read: AtomicU64,
    rows_written: AtomicU64,

    active_jobs: AtomicUsize,
    max_active_jobs: AtomicUsize,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            mappings_started: AtomicU64::new(0),
            mappings_succeeded: AtomicU64::new(0),
            mappings_failed: AtomicU64::new(0),
            rows_read: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            active_jobs: AtomicUsize::new(0),
            max_active_jobs: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.mappings_started.store(0, Ordering::SeqCst);
        self.mappings_succeeded.store(0, Ordering::SeqCst);
        self.mappings_failed.store(0, Ordering::SeqCst);
        self.rows_read.store(0, Ordering::SeqCst);
        self.rows_written.store(0, Ordering::SeqCst);
        self.active_jobs.store(0, Ordering::SeqCst);
        self.max_active_jobs.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_job_start(&self) {
        let _ = self.mappings_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_jobs.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_jobs, now);
    }

    pub fn on_job_success(&self, rows_read: usize, rows_written: usize) {
        let _ = self.mappings_succeeded.fetch_add(1, Ordering::SeqCst);
        let _ = self.rows_read.fetch_add(rows_read as u64, Ordering::SeqCst);
        let _ = self.rows_written.fetch_add(rows_written as u64, Ordering::SeqCst);
        let _ = self.active_jobs.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_job_failure(&self) {
        let _ = self.mappings_failed.fetch_add(1, Ordering::SeqCst);
        let _ = self.active_jobs.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> BatchMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        BatchMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            mappings_started: self.mappings_started.load(Ordering::SeqCst),
            mappings_succeeded: self.mappings_succeeded.load(Ordering::SeqCst),
            mappings_failed: self.mappings_failed.load(Ordering::SeqCst),
            rows_read: self.rows_read.load(Ordering::SeqCst),
            rows_written: self.rows_written.load(Ordering::SeqCst),
            max_active_jobs: self.max_active_jobs.load(Ordering::SeqCst),
        }
    }
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    loop {
        let cur = dst.load(Ordering::SeqCst);
        if now <= cur {
            break;
        }
        if dst
            .compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            break;
        }
    }
}

/// Immutable snapshot of [`BatchMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub mappings_started: u64,
    pub mappings_succeeded: u64,
    pub mappings_failed: u64,
    pub rows_read: u64,
    pub rows_written: u64,
    pub max_active_jobs: usize,
}

impl fmt::Display for BatchMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, mappings={}/{} ok, failed={}, rows_read={}, rows_written={}, max_active_jobs={}, elapsed={:?}",
            self.run_id,
            self.mappings_succeeded,
            self.mappings_started,
            self.mappings_failed,
            self.rows_read,
            self.rows_written,
            self.max_active_jobs,
            self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{severity_for_error, BatchMetrics, ExportSeverity};
    use crate::error::ExportError;

    #[test]
    fn io_failures_are_critical() {
        let e = ExportError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_for_error(&e), ExportSeverity::Critical);
        let e = ExportError::MissingColumns {
            columns: vec!["Stock".to_string()],
            available: Vec::new(),
        };
        assert_eq!(severity_for_error(&e), ExportSeverity::Error);
        assert!(ExportSeverity::Critical > ExportSeverity::Error);
    }

    #[test]
    fn metrics_reset_per_run() {
        let m = BatchMetrics::new();
        m.begin_run();
        m.on_job_start();
        m.on_job_start();
        m.on_job_success(10, 4);
        m.on_job_failure();

        let snap = m.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.mappings_started, 2);
        assert_eq!(snap.mappings_succeeded, 1);
        assert_eq!(snap.mappings_failed, 1);
        assert_eq!(snap.rows_read, 10);
        assert_eq!(snap.rows_written, 4);
        assert_eq!(snap.max_active_jobs, 2);

        m.begin_run();
        let snap = m.snapshot();
        assert_eq!(snap.run_id, 2);
        assert_eq!(snap.mappings_started, 0);
        assert_eq!(snap.elapsed, None);
    }
}
