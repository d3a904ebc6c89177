//! Structured observability hooks for run lifecycle events.
//!
//! Emission functions for the key moments of one orchestrated run:
//! start, check selection, check completion, status recording. Events
//! are emitted at `info!` level; recording failures at `warn!`.

use tracing::{info, warn};

use crate::outcome::JobStatus;

/// Emit event: orchestration started for a job.
pub fn emit_run_started(run_id: &str, job_name: &str, review_request: bool) {
    info!(
        event = "run.started",
        run_id = %run_id,
        job = %job_name,
        review_request = review_request,
    );
}

/// Emit event: one check plan selected for the run.
pub fn emit_check_selected(run_id: &str, scope: &str, file_count: usize) {
    info!(
        event = "check.selected",
        run_id = %run_id,
        scope = %scope,
        file_count = file_count,
    );
}

/// Emit event: the selected check finished with a terminal outcome.
pub fn emit_check_finished(run_id: &str, scope: &str, passed: bool, duration_ms: u64) {
    info!(
        event = "check.finished",
        run_id = %run_id,
        scope = %scope,
        passed = passed,
        duration_ms = duration_ms,
    );
}

/// Emit event: terminal status persisted for the job.
pub fn emit_status_recorded(run_id: &str, job_name: &str, status: JobStatus) {
    info!(
        event = "status.recorded",
        run_id = %run_id,
        job = %job_name,
        status = %status,
    );
}

/// Emit event: status recording failed (warning level).
pub fn emit_record_error(run_id: &str, job_name: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "status.record_error",
        run_id = %run_id,
        job = %job_name,
        error = %error,
    );
}
