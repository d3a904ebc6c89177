use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::changeset::RunTrigger;
use crate::orchestrator::RunReport;
use crate::outcome::{CheckScope, JobStatus};

/// Canonical run summary artifact written for CI and PR reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummaryArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub job_name: String,
    pub trigger: RunTrigger,
    pub status: JobStatus,
    pub scope: Option<CheckScope>,
    pub passed: bool,
    pub duration_ms: u64,
    pub diagnostics_bytes: usize,
    pub diagnostics_truncated: bool,
    pub error: Option<String>,
}

impl RunSummaryArtifact {
    /// Build the artifact for a finished run.
    pub fn from_report(report: &RunReport) -> Self {
        let (diagnostics_bytes, diagnostics_truncated) = report
            .outcome
            .as_ref()
            .map(|outcome| {
                (
                    outcome.diagnostics.total_bytes(),
                    outcome.diagnostics.is_truncated(),
                )
            })
            .unwrap_or((0, false));

        Self {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            run_id: report.run_id.as_str().to_string(),
            job_name: report.job_name.clone(),
            trigger: report.trigger,
            status: report.status,
            scope: report.scope(),
            passed: report.passed(),
            duration_ms: report.duration_ms,
            diagnostics_bytes,
            diagnostics_truncated,
            error: report.error.clone(),
        }
    }
}

/// Write the run summary in pretty JSON format.
pub fn write_run_summary_json(path: &Path, artifact: &RunSummaryArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize run summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::RunReport;
    use crate::outcome::{CheckOutcome, Diagnostics};
    use serde_json::json;

    fn sample_report() -> RunReport {
        // Assemble through the orchestrator-owned types so the artifact
        // test stays honest about field mapping.
        let runner = std::sync::Arc::new(crate::fakes::ScriptedRunner::new());
        runner.push_outcome(CheckOutcome {
            scope: CheckScope::Scoped,
            passed: false,
            diagnostics: Diagnostics::capture(b"trailing whitespace: a.py", 1024),
        });
        let recorder = std::sync::Arc::new(crate::fakes::MemoryStatusRecorder::new());
        let orch = crate::orchestrator::Orchestrator::new("pre-commit", runner, recorder);
        let changes = crate::changeset::ChangeSet::default()
            .with_category(crate::changeset::CATEGORY_REPO, true)
            .with_files(
                crate::changeset::CATEGORY_REPO,
                vec![std::path::PathBuf::from("a.py")],
            );

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime");
        rt.block_on(orch.run(RunTrigger::ReviewRequest, &changes))
            .expect("run")
    }

    #[test]
    fn run_summary_schema_has_expected_keys() {
        let artifact = RunSummaryArtifact::from_report(&sample_report());

        let raw = serde_json::to_value(&artifact).expect("serialize artifact");
        let obj = raw.as_object().expect("artifact object");
        assert!(obj.contains_key("schema_version"));
        assert!(obj.contains_key("generated_at"));
        assert!(obj.contains_key("run_id"));
        assert!(obj.contains_key("job_name"));
        assert!(obj.contains_key("trigger"));
        assert!(obj.contains_key("status"));
        assert!(obj.contains_key("scope"));
        assert!(obj.contains_key("passed"));
        assert!(obj.contains_key("duration_ms"));
        assert!(obj.contains_key("diagnostics_bytes"));
        assert!(obj.contains_key("diagnostics_truncated"));

        assert_eq!(raw["schema_version"], json!("1.0"));
        assert_eq!(raw["trigger"], json!("review_request"));
        assert_eq!(raw["status"], json!("failure"));
        assert_eq!(raw["scope"], json!("scoped"));
        assert_eq!(raw["passed"], json!(false));
        assert_eq!(raw["diagnostics_bytes"], json!(25));
    }

    #[test]
    fn artifact_survives_a_json_roundtrip() {
        let artifact = RunSummaryArtifact::from_report(&sample_report());
        let raw = serde_json::to_string(&artifact).expect("serialize");
        let parsed: RunSummaryArtifact = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(artifact, parsed);
    }

    #[test]
    fn aborted_check_step_reports_no_scope() {
        let runner = std::sync::Arc::new(crate::fakes::ScriptedRunner::new());
        let recorder = std::sync::Arc::new(crate::fakes::MemoryStatusRecorder::new());
        let orch = crate::orchestrator::Orchestrator::new("pre-commit", runner, recorder);
        let changes = crate::changeset::ChangeSet::default()
            .with_category(crate::changeset::CATEGORY_REPO, true);

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime");
        let report = rt
            .block_on(orch.run(RunTrigger::ReviewRequest, &changes))
            .expect("run");

        let artifact = RunSummaryArtifact::from_report(&report);
        assert_eq!(artifact.scope, None);
        assert_eq!(artifact.status, JobStatus::Failure);
        assert!(artifact.error.as_deref().unwrap().contains("repo"));
        assert_eq!(artifact.diagnostics_bytes, 0);
    }

    #[test]
    fn write_summary_creates_the_file() {
        let artifact = RunSummaryArtifact::from_report(&sample_report());
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run_summary.json");
        write_run_summary_json(&path, &artifact).expect("write summary");

        let raw = std::fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("\"schema_version\": \"1.0\""));
    }
}
