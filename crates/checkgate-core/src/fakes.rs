//! In-memory fakes for the runner and recorder seams (testing only)
//!
//! Provides `ScriptedRunner`, `StalledRunner` and `MemoryStatusRecorder`
//! that satisfy the trait contracts without subprocesses or a
//! filesystem.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RecordError, ToolError};
use crate::outcome::{CheckOutcome, CheckScope, Diagnostics, JobResult, JobStatus};
use crate::recorder::StatusRecorder;
use crate::runner::CheckRunner;

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// One recorded call into a [`ScriptedRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerInvocation {
    All,
    Scoped(Vec<PathBuf>),
}

/// Check runner that replays scripted results and records every call.
///
/// With an empty script each call yields a passing outcome in the
/// matching scope.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<Result<CheckOutcome, ToolError>>>,
    invocations: Mutex<Vec<RunnerInvocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next call.
    pub fn push_outcome(&self, outcome: CheckOutcome) {
        self.script.lock().unwrap().push_back(Ok(outcome));
    }

    /// Queue an error for the next call.
    pub fn push_error(&self, error: ToolError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Every call made so far, in order.
    pub fn invocations(&self) -> Vec<RunnerInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn next(&self, scope: CheckScope) -> Result<CheckOutcome, ToolError> {
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(CheckOutcome {
                scope,
                passed: true,
                diagnostics: Diagnostics::empty(),
            }),
        }
    }
}

#[async_trait]
impl CheckRunner for ScriptedRunner {
    async fn run_all(&self) -> Result<CheckOutcome, ToolError> {
        self.invocations
            .lock()
            .unwrap()
            .push(RunnerInvocation::All);
        self.next(CheckScope::All)
    }

    async fn run_scoped(&self, files: &[PathBuf]) -> Result<CheckOutcome, ToolError> {
        self.invocations
            .lock()
            .unwrap()
            .push(RunnerInvocation::Scoped(files.to_vec()));
        self.next(CheckScope::Scoped)
    }
}

// ---------------------------------------------------------------------------
// StalledRunner
// ---------------------------------------------------------------------------

/// Check runner whose calls never complete. For cancellation tests.
#[derive(Debug, Default)]
pub struct StalledRunner;

#[async_trait]
impl CheckRunner for StalledRunner {
    async fn run_all(&self) -> Result<CheckOutcome, ToolError> {
        std::future::pending().await
    }

    async fn run_scoped(&self, _files: &[PathBuf]) -> Result<CheckOutcome, ToolError> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// MemoryStatusRecorder
// ---------------------------------------------------------------------------

/// In-memory status recorder backed by a `HashMap<job_name, status>`.
///
/// Logs every write attempt, including ones failed by injection, so
/// tests can assert recording was attempted exactly once.
#[derive(Debug, Default)]
pub struct MemoryStatusRecorder {
    slots: Mutex<HashMap<String, JobStatus>>,
    write_log: Mutex<Vec<JobResult>>,
    failing: AtomicBool,
}

impl MemoryStatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `record` call fails with an injected store error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Last recorded status for a job, if any.
    pub fn recorded(&self, job_name: &str) -> Option<JobStatus> {
        self.slots.lock().unwrap().get(job_name).copied()
    }

    /// Every write attempt so far, in order.
    pub fn write_log(&self) -> Vec<JobResult> {
        self.write_log.lock().unwrap().clone()
    }
}

impl StatusRecorder for MemoryStatusRecorder {
    fn record(&self, result: &JobResult) -> Result<(), RecordError> {
        self.write_log.lock().unwrap().push(result.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecordError::Io {
                path: PathBuf::from(&result.job_name),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected status store failure",
                ),
            });
        }
        self.slots
            .lock()
            .unwrap()
            .insert(result.job_name.clone(), result.status);
        Ok(())
    }

    fn read(&self, job_name: &str) -> Result<Option<JobStatus>, RecordError> {
        Ok(self.recorded(job_name))
    }
}
