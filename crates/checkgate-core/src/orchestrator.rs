//! Run orchestration: select one check, execute it, record the status.
//!
//! The orchestrator owns the invariant that every run leaves exactly
//! one durable status behind. The happy path and every check-step
//! error record explicitly; a run abandoned mid-flight records
//! `Cancelled` through the [`StatusGuard`] drop hook.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use uuid::Uuid;

use crate::changeset::{ChangeSet, RunTrigger};
use crate::decision::{select_plan, CheckPlan};
use crate::error::{ChangeSetError, GateError, RecordError, Result};
use crate::obs;
use crate::outcome::{CheckOutcome, CheckScope, JobResult, JobStatus};
use crate::recorder::StatusRecorder;
use crate::runner::CheckRunner;

/// Unique identifier for one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

impl RunId {
    fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything known about a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier assigned to this run.
    pub run_id: RunId,

    /// Job name the status was recorded under.
    pub job_name: String,

    /// What kind of run this was.
    pub trigger: RunTrigger,

    /// Terminal status, as recorded.
    pub status: JobStatus,

    /// Outcome of the selected check. `None` when the check step
    /// aborted before producing one.
    pub outcome: Option<CheckOutcome>,

    /// Rendered check-step error, when the step aborted.
    pub error: Option<String>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Scope the check ran in, when a terminal outcome exists.
    pub fn scope(&self) -> Option<CheckScope> {
        self.outcome.as_ref().map(|outcome| outcome.scope)
    }

    /// Whether the run ended in `Success`.
    pub fn passed(&self) -> bool {
        self.status == JobStatus::Success
    }
}

/// Armed before any fallible work; disarmed by [`StatusGuard::finish`].
///
/// Dropping an armed guard means the run future was abandoned before
/// reaching its explicit recording step, so `Cancelled` is recorded
/// best-effort. Recording failures on this path can only be logged.
struct StatusGuard {
    recorder: Arc<dyn StatusRecorder>,
    run_id: RunId,
    job_name: String,
    armed: bool,
}

impl StatusGuard {
    fn arm(recorder: Arc<dyn StatusRecorder>, run_id: RunId, job_name: &str) -> Self {
        Self {
            recorder,
            run_id,
            job_name: job_name.to_string(),
            armed: true,
        }
    }

    /// Record the terminal status and disarm the guard.
    fn finish(mut self, status: JobStatus) -> std::result::Result<(), RecordError> {
        self.armed = false;
        self.recorder.record(&JobResult {
            job_name: self.job_name.clone(),
            status,
        })
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let result = JobResult {
            job_name: self.job_name.clone(),
            status: JobStatus::Cancelled,
        };
        match self.recorder.record(&result) {
            Ok(()) => {
                obs::emit_status_recorded(self.run_id.as_str(), &self.job_name, result.status)
            }
            Err(e) => obs::emit_record_error(self.run_id.as_str(), &self.job_name, &e),
        }
    }
}

/// Orchestrates one run: decide, execute, record.
pub struct Orchestrator {
    job_name: String,
    runner: Arc<dyn CheckRunner>,
    recorder: Arc<dyn StatusRecorder>,
}

impl Orchestrator {
    pub fn new(
        job_name: impl Into<String>,
        runner: Arc<dyn CheckRunner>,
        recorder: Arc<dyn StatusRecorder>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            runner,
            recorder,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Execute one run end to end.
    ///
    /// Check-step errors fold into the report as `Failure` instead of
    /// escaping, so the terminal status still gets recorded. The only
    /// `Err` this returns is a recording failure, which the caller must
    /// treat as a failed run even when the check itself passed.
    pub async fn run(
        &self,
        trigger: RunTrigger,
        changes: &ChangeSet,
    ) -> std::result::Result<RunReport, RecordError> {
        self.run_inner(trigger, Ok(changes)).await
    }

    /// Like [`Orchestrator::run`], taking the outcome of loading the
    /// change signal.
    ///
    /// A load failure is carried into the guarded run and folds to a
    /// recorded `Failure`, so a malformed or unreadable change signal
    /// still leaves a durable status behind instead of aborting before
    /// the recording step.
    pub async fn run_with(
        &self,
        trigger: RunTrigger,
        changes: std::result::Result<ChangeSet, ChangeSetError>,
    ) -> std::result::Result<RunReport, RecordError> {
        match changes {
            Ok(changes) => self.run_inner(trigger, Ok(&changes)).await,
            Err(e) => self.run_inner(trigger, Err(e)).await,
        }
    }

    async fn run_inner(
        &self,
        trigger: RunTrigger,
        changes: std::result::Result<&ChangeSet, ChangeSetError>,
    ) -> std::result::Result<RunReport, RecordError> {
        let start = Instant::now();
        let run_id = RunId::new();
        let guard = StatusGuard::arm(self.recorder.clone(), run_id.clone(), &self.job_name);

        obs::emit_run_started(run_id.as_str(), &self.job_name, trigger.is_review_request());

        let step = match changes {
            Ok(changes) => self.check_step(&run_id, trigger, changes).await,
            Err(e) => Err(GateError::ChangeSet(e)),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (status, outcome, error) = match step {
            Ok(outcome) => {
                obs::emit_check_finished(
                    run_id.as_str(),
                    outcome.scope.as_str(),
                    outcome.passed,
                    duration_ms,
                );
                let status = if outcome.passed {
                    JobStatus::Success
                } else {
                    JobStatus::Failure
                };
                (status, Some(outcome), None)
            }
            Err(e) => {
                debug!(run_id = %run_id, error = %e, "check step aborted");
                (JobStatus::Failure, None, Some(e.to_string()))
            }
        };

        guard.finish(status)?;
        obs::emit_status_recorded(run_id.as_str(), &self.job_name, status);

        Ok(RunReport {
            run_id,
            job_name: self.job_name.clone(),
            trigger,
            status,
            outcome,
            error,
            duration_ms,
        })
    }

    async fn check_step(
        &self,
        run_id: &RunId,
        trigger: RunTrigger,
        changes: &ChangeSet,
    ) -> Result<CheckOutcome> {
        let plan = select_plan(trigger, changes)?;
        obs::emit_check_selected(run_id.as_str(), plan_scope(&plan).as_str(), plan.file_count());

        match plan {
            CheckPlan::All => Ok(self.runner.run_all().await?),
            CheckPlan::Scoped(files) => Ok(self.runner.run_scoped(&files).await?),
            CheckPlan::Skip => Ok(CheckOutcome::skipped()),
        }
    }
}

fn plan_scope(plan: &CheckPlan) -> CheckScope {
    match plan {
        CheckPlan::All => CheckScope::All,
        CheckPlan::Scoped(_) => CheckScope::Scoped,
        CheckPlan::Skip => CheckScope::Skipped,
    }
}
