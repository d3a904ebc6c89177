//! checkgate - change-scoped check orchestration for CI jobs
//!
//! The `checkgate` command runs exactly one validation pass per CI job:
//! a full pass over every tracked file, a pass scoped to the changed
//! files reported by the pipeline, or no pass at all when nothing
//! relevant changed. Whatever happens, the job's terminal status lands
//! in a per-job status slot for downstream aggregation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;

use checkgate_core::{
    init_tracing, write_run_summary_json, ChangeSet, ChangeSetError, CheckToolConfig,
    CommandCheckRunner, FsStatusRecorder, Orchestrator, RunReport, RunSummaryArtifact, RunTrigger,
    DEFAULT_STATUS_DIR,
};

#[derive(Parser)]
#[command(name = "checkgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Change-scoped check orchestration for CI jobs", long_about = None)]
struct Cli {
    /// Job name used for the durable status slot
    #[arg(long, env = "CHECKGATE_JOB_NAME", default_value = "pre-commit")]
    job_name: String,

    /// What kind of run this is
    #[arg(long, value_enum, env = "CHECKGATE_TRIGGER", default_value = "branch")]
    trigger: TriggerArg,

    /// Change set JSON file ('-' for stdin; omitted means empty)
    #[arg(long)]
    changes: Option<PathBuf>,

    /// Directory holding per-job status slots
    #[arg(long, env = "CHECKGATE_STATUS_DIR", default_value = DEFAULT_STATUS_DIR)]
    status_dir: PathBuf,

    /// Check tool executable
    #[arg(long, env = "CHECKGATE_TOOL")]
    tool: Option<String>,

    /// Tool argument preceding the scope flag (repeatable, replaces defaults)
    #[arg(long = "tool-arg", allow_hyphen_values = true)]
    tool_args: Vec<String>,

    /// Flag the tool expects for a full pass
    #[arg(long, allow_hyphen_values = true)]
    all_files_flag: Option<String>,

    /// Flag the tool expects before an explicit path list
    #[arg(long, allow_hyphen_values = true)]
    files_flag: Option<String>,

    /// Tool timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Working directory for the tool
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Write a JSON run summary artifact to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TriggerArg {
    /// Evaluating a proposed change set before integration
    ReviewRequest,
    /// Direct or scheduled run against integrated content
    Branch,
}

impl From<TriggerArg> for RunTrigger {
    fn from(arg: TriggerArg) -> Self {
        match arg {
            TriggerArg::ReviewRequest => RunTrigger::ReviewRequest,
            TriggerArg::Branch => RunTrigger::Branch,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    run_gate(cli).await
}

/// Orchestrate one run and map it to the process exit code.
///
/// The run future races the shutdown signals; losing the race drops it
/// mid-flight, which records `Cancelled` through the orchestrator's
/// guard before this function returns.
async fn run_gate(cli: Cli) -> Result<()> {
    let trigger = RunTrigger::from(cli.trigger);

    let runner = Arc::new(CommandCheckRunner::new(tool_config(&cli)));
    let recorder = Arc::new(
        FsStatusRecorder::new(&cli.status_dir)
            .with_context(|| format!("open status store at {:?}", cli.status_dir))?,
    );
    let orchestrator = Orchestrator::new(cli.job_name.clone(), runner, recorder);

    // The status store is the only fallible step before the guarded
    // run; a bad --changes input folds into the run and still records
    // Failure for the job.
    let load = load_changeset(cli.changes.as_deref());

    let report = tokio::select! {
        result = orchestrator.run_with(trigger, load) => {
            result.context("record job status")?
        }
        _ = wait_for_shutdown_signal() => {
            bail!("run cancelled by signal")
        }
    };

    print_report(&report);

    if let Some(path) = cli.summary.as_deref() {
        let artifact = RunSummaryArtifact::from_report(&report);
        write_run_summary_json(path, &artifact)
            .with_context(|| format!("write run summary to {:?}", path))?;
    }

    if report.passed() {
        Ok(())
    } else {
        bail!(
            "job '{}' finished with status {}",
            report.job_name,
            report.status
        )
    }
}

/// Read the change set from a file, stdin (`-`), or default to empty.
fn load_changeset(path: Option<&Path>) -> std::result::Result<ChangeSet, ChangeSetError> {
    let Some(path) = path else {
        return Ok(ChangeSet::default());
    };

    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| ChangeSetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        return ChangeSet::from_json_str(&buf);
    }

    ChangeSet::from_json_file(path)
}

/// Apply CLI overrides on top of the default tool configuration.
fn tool_config(cli: &Cli) -> CheckToolConfig {
    let mut config = CheckToolConfig::default();
    if let Some(tool) = &cli.tool {
        config.program = tool.clone();
    }
    if !cli.tool_args.is_empty() {
        config.base_args = cli.tool_args.clone();
    }
    if let Some(flag) = &cli.all_files_flag {
        config.all_files_flag = flag.clone();
    }
    if let Some(flag) = &cli.files_flag {
        config.files_flag = flag.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }
    if let Some(dir) = &cli.workdir {
        config.work_dir = dir.clone();
    }
    config
}

fn print_report(report: &RunReport) {
    println!("Run ID: {}", report.run_id);
    println!("Job: {}", report.job_name);
    match report.scope() {
        Some(scope) => println!("Scope: {}", scope),
        None => println!("Scope: (check step aborted)"),
    }
    println!(
        "Status: {}",
        if report.passed() {
            "✓ PASSED"
        } else {
            "✗ FAILED"
        }
    );
    println!("Duration: {}ms", report.duration_ms);

    if let Some(outcome) = &report.outcome {
        if !outcome.passed && !outcome.diagnostics.is_empty() {
            println!();
            println!("{}", outcome.diagnostics.text());
        }
    }
    if let Some(error) = &report.error {
        println!();
        println!("Error: {}", error);
    }
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
