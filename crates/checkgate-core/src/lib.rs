//! checkgate core - change-scoped check orchestration
//!
//! Provides the run orchestrator that:
//! - Decides whether the validation tool checks every tracked file or
//!   only the changed set reported by the pipeline
//! - Executes exactly one check (or none) per run
//! - Durably records each job's terminal status for downstream
//!   aggregation, on every exit path including cancellation

pub mod changeset;
pub mod decision;
pub mod error;
pub mod fakes;
pub mod obs;
pub mod orchestrator;
pub mod outcome;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod telemetry;

// Re-export key types
pub use changeset::{
    ChangeSet, RunTrigger, CATEGORY_CHECK_CONFIG, CATEGORY_REPO, FILES_KEY_SUFFIX,
};
pub use decision::{select_plan, CheckPlan};
pub use error::{ChangeSetError, GateError, RecordError, Result, ToolError};
pub use orchestrator::{Orchestrator, RunId, RunReport};
pub use outcome::{CheckOutcome, CheckScope, Diagnostics, JobResult, JobStatus};
pub use recorder::{FsStatusRecorder, StatusRecorder, DEFAULT_STATUS_DIR};
pub use report::{write_run_summary_json, RunSummaryArtifact};
pub use runner::{
    CheckRunner, CheckToolConfig, CommandCheckRunner, DEFAULT_TOOL_TIMEOUT_SECS,
};
pub use telemetry::init_tracing;
