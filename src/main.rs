//! `table-exporter` command-line interface.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{error, info};

use table_exporter::config::{discover_configs, load_config};
use table_exporter::execution::{BatchReport, BatchRunner, ExecutionOptions, MappingJob, TracingObserver};
use table_exporter::logging::{init_logging, LogConfig, LogFormat};
use table_exporter::processor::ResolutionPolicy;

#[derive(Parser)]
#[command(
    name = "table-exporter",
    version,
    about = "Export master-data spreadsheets to CSV files and C# classes",
    long_about = "Export master-data spreadsheets to CSV files and C# classes.\n\n\
                  Each config file lists mappings; every mapping reads one sheet whose first\n\
                  row holds column types and whose second row holds column names."
)]
struct Cli {
    /// Config files, directories (searched for *.yaml / *.yml) or glob patterns.
    #[arg(value_name = "CONFIG", required = true)]
    configs: Vec<String>,

    /// Number of mappings processed in parallel (default: available cores).
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<usize>,

    /// Write classes without missing source columns; the mapping still fails on its CSV.
    #[arg(long = "lenient")]
    lenient: bool,

    /// Process every mapping without writing any artifact.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Write a JSON run summary to this path.
    #[arg(long = "report", value_name = "PATH")]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "compact")]
    log_format: LogFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Compact,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Pretty => LogFormat::Pretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(cli.log_format.into())
        .with_ansi(io::stderr().is_terminal());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when at least one config or mapping failed.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let paths = discover_configs(&cli.configs).context("resolving config inputs")?;

    let mut jobs = Vec::new();
    let mut broken_configs = 0usize;
    for path in &paths {
        match load_config(path) {
            Ok(config) => {
                info!(config = %path.display(), mappings = ?config.mapping_names(), "loaded config");
                jobs.extend(MappingJob::from_config(path, &config));
            }
            Err(e) => {
                error!("{e}");
                broken_configs += 1;
            }
        }
    }

    let runner = BatchRunner::new(ExecutionOptions {
        num_threads: cli.jobs,
        resolution: if cli.lenient {
            ResolutionPolicy::Lenient
        } else {
            ResolutionPolicy::Strict
        },
        dry_run: cli.dry_run,
    })?
    .with_observer(Arc::new(TracingObserver));

    let outcomes = runner.run(&jobs);
    let report = BatchReport::new(&outcomes, runner.metrics().snapshot());

    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    if report.failed > 0 || broken_configs > 0 {
        error!(
            failed_mappings = report.failed,
            broken_configs, "export finished with failures"
        );
    }
    Ok(report.is_success() && broken_configs == 0)
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use table_exporter::logging::LogFormat;

    use super::Cli;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_format_flag_selects_format() {
        let cli = Cli::try_parse_from(["table-exporter", "--log-format", "pretty", "client.yaml"]).unwrap();
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Pretty);

        let cli = Cli::try_parse_from(["table-exporter", "client.yaml"]).unwrap();
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Compact);
        assert_eq!(cli.configs, vec!["client.yaml".to_string()]);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["table-exporter", "-q", "-v", "client.yaml"]).is_err());
    }
}
