//! Batch execution of mapping jobs with configurable parallelism.
//!
//! This module sits "above" [`crate::processor`] and provides:
//!
//! - Loading, processing and writing of each mapping as one isolated job
//! - Parallel execution on a dedicated rayon pool
//! - Real-time metrics + observer hooks for monitoring
//!
//! A failing job never stops its siblings; outcomes come back in job order.

mod observer;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::codegen::CodegenOptions;
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::ingestion::{load_source, LoadOptions};
use crate::mapping::MappingSpec;
use crate::output::{write_class, write_dataset, WrittenArtifacts};
use crate::processor::{MappingProcessor, ProcessorOptions, ResolutionPolicy};

pub use observer::{
    severity_for_error, BatchMetrics, BatchMetricsSnapshot, ExportEvent, ExportObserver, ExportSeverity,
    TracingObserver,
};
pub use report::{BatchReport, MappingReport, MappingStatus};

/// Configuration for the [`BatchRunner`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// How missing source columns are handled.
    pub resolution: ResolutionPolicy,
    /// Process every mapping but skip writing artifacts.
    pub dry_run: bool,
}

/// One mapping together with the configuration it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingJob {
    pub config_path: PathBuf,
    pub codegen: CodegenOptions,
    pub spec: MappingSpec,
}

impl MappingJob {
    /// Expand a configuration file into jobs, in file order.
    pub fn from_config(config_path: &Path, config: &ExportConfig) -> Vec<MappingJob> {
        config
            .mappings
            .iter()
            .map(|spec| MappingJob {
                config_path: config_path.to_path_buf(),
                codegen: config.codegen.clone(),
                spec: spec.clone(),
            })
            .collect()
    }
}

/// Counts for one successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Data rows in the source (metadata rows excluded).
    pub input_rows: usize,
    /// Rows left after filtering.
    pub output_rows: usize,
    /// Properties in the generated class.
    pub fields: usize,
    /// `None` for dry runs.
    pub written: Option<WrittenArtifacts>,
}

/// Result of one job.
#[derive(Debug)]
pub struct MappingOutcome {
    pub name: String,
    pub config_path: PathBuf,
    pub elapsed: Duration,
    pub result: ExportResult<ExportSummary>,
}

impl MappingOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs mapping jobs on a dedicated thread pool.
pub struct BatchRunner {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExportObserver>>,
    metrics: Arc<BatchMetrics>,
}

impl BatchRunner {
    /// Create a runner with the given options.
    ///
    /// `num_threads == Some(0)` is rejected as an invalid configuration.
    pub fn new(opts: ExecutionOptions) -> ExportResult<Self> {
        if opts.num_threads == Some(0) {
            return Err(ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "num_threads must be > 0 when set",
            )));
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("table-exporter-{i}"))
            .build()
            .map_err(|e| ExportError::Io(std::io::Error::other(e)))?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(BatchMetrics::new()),
        })
    }

    /// Attach an observer for batch events.
    pub fn with_observer(mut self, observer: Arc<dyn ExportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time batch metrics.
    pub fn metrics(&self) -> Arc<BatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run every job and return one outcome per job, in input order.
    pub fn run(&self, jobs: &[MappingJob]) -> Vec<MappingOutcome> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExportEvent::BatchStarted { jobs: jobs.len() });

        let outcomes: Vec<MappingOutcome> = self
            .pool
            .install(|| jobs.par_iter().map(|job| self.run_job(job)).collect());

        self.metrics.end_run(start.elapsed());
        self.emit(ExportEvent::BatchFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        outcomes
    }

    fn run_job(&self, job: &MappingJob) -> MappingOutcome {
        let start = Instant::now();
        self.metrics.on_job_start();
        self.emit(ExportEvent::MappingStarted {
            name: job.spec.name.clone(),
            source: job.spec.source_path.clone(),
        });

        let result = execute_job(job, self.opts.resolution, self.opts.dry_run);
        let elapsed = start.elapsed();

        match &result {
            Ok(summary) => {
                self.metrics.on_job_success(summary.input_rows, summary.output_rows);
                self.emit(ExportEvent::MappingExported {
                    name: job.spec.name.clone(),
                    output_rows: summary.output_rows,
                    elapsed,
                    dry_run: summary.written.is_none(),
                });
            }
            Err(e) => {
                self.metrics.on_job_failure();
                self.emit(ExportEvent::MappingFailed {
                    name: job.spec.name.clone(),
                    severity: severity_for_error(e),
                    error: e.to_string(),
                });
            }
        }

        MappingOutcome {
            name: job.spec.name.clone(),
            config_path: job.config_path.clone(),
            elapsed,
            result,
        }
    }

    fn emit(&self, event: ExportEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// Load, process and (unless `dry_run`) write one job.
///
/// Under [`ResolutionPolicy::Lenient`] the class is written even when the dataset
/// branch fails; the job still reports the dataset error.
pub fn execute_job(job: &MappingJob, resolution: ResolutionPolicy, dry_run: bool) -> ExportResult<ExportSummary> {
    let spec = &job.spec;
    spec.validate()?;

    let source = load_source(
        &spec.source_path,
        &LoadOptions {
            format: None,
            sheet: spec.sheet.clone(),
        },
    )?;

    let processor = MappingProcessor::new(ProcessorOptions {
        resolution,
        codegen: job.codegen.clone(),
    });
    let declaration = processor.declare(spec, &source)?;
    let code = declaration.render(&job.codegen);

    let dataset = match processor.export_dataset(spec, &source) {
        Ok(dataset) => dataset,
        Err(e) => {
            if resolution == ResolutionPolicy::Lenient && !dry_run {
                let cs_path = write_class(spec, &code)?;
                warn!(
                    mapping = %spec.name,
                    path = %cs_path.display(),
                    error = %e,
                    "class written but dataset export failed"
                );
            }
            return Err(e);
        }
    };

    let written = if dry_run {
        None
    } else {
        let cs_path = write_class(spec, &code)?;
        let csv_path = write_dataset(spec, &dataset)?;
        Some(WrittenArtifacts { csv_path, cs_path })
    };

    Ok(ExportSummary {
        input_rows: source.data_row_count(),
        output_rows: dataset.row_count(),
        fields: declaration.fields.len(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{BatchRunner, ExecutionOptions, ExportEvent, ExportObserver, MappingJob};
    use crate::codegen::CodegenOptions;
    use crate::error::ExportError;
    use crate::mapping::{Filters, MappingSpec};
    use crate::processor::ResolutionPolicy;

    fn unique_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn job(dir: &Path, name: &str, sources: &[&str], targets: &[&str]) -> MappingJob {
        MappingJob {
            config_path: PathBuf::from("test.yaml"),
            codegen: CodegenOptions::default(),
            spec: MappingSpec {
                name: name.to_string(),
                source_path: dir.join("items.csv"),
                export_path: dir.join("out"),
                source_columns: sources.iter().map(|s| s.to_string()).collect(),
                target_columns: targets.iter().map(|s| s.to_string()).collect(),
                filters: Filters::new(),
                sheet: None,
            },
        }
    }

    #[derive(Default)]
    struct CollectingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ExportObserver for CollectingObserver {
        fn on_event(&self, event: &ExportEvent) {
            let label = match event {
                ExportEvent::BatchStarted { .. } => "batch_started".to_string(),
                ExportEvent::MappingStarted { name, .. } => format!("started:{name}"),
                ExportEvent::MappingExported { name, .. } => format!("exported:{name}"),
                ExportEvent::MappingFailed { name, .. } => format!("failed:{name}"),
                ExportEvent::BatchFinished { .. } => "batch_finished".to_string(),
            };
            self.events.lock().unwrap().push(label);
        }
    }

    #[test]
    fn failing_job_does_not_stop_siblings() {
        let dir = unique_dir("table_exporter_batch");
        std::fs::write(
            dir.join("items.csv"),
            "int,string,float\nID,Name,Price\n1,Potion,2.5\n2,Ether,7\n",
        )
        .unwrap();

        let jobs = vec![
            job(&dir, "Good", &["ID", "Name"], &["id", "name"]),
            job(&dir, "Bad", &["ID", "Stock"], &["id", "stock"]),
            job(&dir, "AlsoGood", &["Price"], &["price"]),
        ];

        let observer = Arc::new(CollectingObserver::default());
        let obs_trait: Arc<dyn ExportObserver> = observer.clone();
        let runner = BatchRunner::new(ExecutionOptions {
            num_threads: Some(2),
            ..Default::default()
        })
        .unwrap()
        .with_observer(obs_trait);

        let outcomes = runner.run(&jobs);
        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Bad", "AlsoGood"]);
        assert!(outcomes[0].is_success());
        assert!(matches!(outcomes[1].result, Err(ExportError::MissingColumns { .. })));
        assert!(outcomes[2].is_success());

        assert!(dir.join("out/csv/Good.csv").exists());
        assert!(dir.join("out/cs/AlsoGood.cs").exists());
        assert!(!dir.join("out/csv/Bad.csv").exists());
        assert!(!dir.join("out/cs/Bad.cs").exists());

        let snap = runner.metrics().snapshot();
        assert_eq!(snap.mappings_succeeded, 2);
        assert_eq!(snap.mappings_failed, 1);
        assert_eq!(snap.rows_read, 4);

        let events = observer.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("batch_started"));
        assert_eq!(events.last().map(String::as_str), Some("batch_finished"));
        assert!(events.contains(&"failed:Bad".to_string()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = unique_dir("table_exporter_dry_run");
        std::fs::write(dir.join("items.csv"), "int\nID\n1\n").unwrap();

        let runner = BatchRunner::new(ExecutionOptions {
            num_threads: Some(1),
            dry_run: true,
            ..Default::default()
        })
        .unwrap();
        let outcomes = runner.run(&[job(&dir, "Item", &["ID"], &["id"])]);

        let summary = outcomes[0].result.as_ref().unwrap();
        assert_eq!(summary.output_rows, 1);
        assert_eq!(summary.fields, 1);
        assert!(summary.written.is_none());
        assert!(!dir.join("out").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn lenient_job_writes_class_before_dataset_failure() {
        let dir = unique_dir("table_exporter_lenient");
        std::fs::write(dir.join("items.csv"), "int,float\nID,Price\n1,2.5\n").unwrap();
        let jobs = [job(&dir, "Item", &["Weight", "Price"], &["weight", "price"])];

        let dry = BatchRunner::new(ExecutionOptions {
            num_threads: Some(1),
            resolution: ResolutionPolicy::Lenient,
            dry_run: true,
        })
        .unwrap();
        assert!(!dry.run(&jobs)[0].is_success());
        assert!(!dir.join("out").exists());

        let runner = BatchRunner::new(ExecutionOptions {
            num_threads: Some(1),
            resolution: ResolutionPolicy::Lenient,
            dry_run: false,
        })
        .unwrap();
        let outcomes = runner.run(&jobs);
        assert!(matches!(outcomes[0].result, Err(ExportError::MissingColumns { .. })));
        assert_eq!(runner.metrics().snapshot().mappings_failed, 1);

        let code = std::fs::read_to_string(dir.join("out/cs/Item.cs")).unwrap();
        assert!(code.contains("public float Weight { get; private set; }"));
        assert!(!code.contains(" Price {"));
        assert!(!dir.join("out/csv/Item.csv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_source_file_fails_only_that_job() {
        let dir = unique_dir("table_exporter_missing_source");
        let runner = BatchRunner::new(ExecutionOptions::default()).unwrap();
        let outcomes = runner.run(&[job(&dir, "Item", &["ID"], &["id"])]);
        assert!(!outcomes[0].is_success());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn zero_threads_is_rejected() {
        let opts = ExecutionOptions {
            num_threads: Some(0),
            ..Default::default()
        };
        assert!(BatchRunner::new(opts).is_err());
    }
}
