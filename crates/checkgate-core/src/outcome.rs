//! Check outcomes and the durable per-job status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which file population a check ran against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckScope {
    /// Every file under the tool's own configured scope.
    All,
    /// Exactly the changed files supplied by the pipeline.
    Scoped,
    /// No check ran; the run passed vacuously.
    Skipped,
}

impl CheckScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckScope::All => "all",
            CheckScope::Scoped => "scoped",
            CheckScope::Skipped => "skipped",
        }
    }
}

impl fmt::Display for CheckScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Captured tool output.
///
/// Stored lossily decoded as UTF-8 and truncated at a caller-supplied
/// cap; `total_bytes` always reflects the pre-truncation size.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostics {
    text: String,
    truncated: bool,
    total_bytes: usize,
}

impl Diagnostics {
    /// Default capture cap in bytes (1 MiB).
    pub const MAX_BYTES: usize = 1024 * 1024;

    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture raw tool output, truncating at `cap` bytes.
    pub fn capture(raw: &[u8], cap: usize) -> Self {
        let total_bytes = raw.len();
        if total_bytes <= cap {
            return Self {
                text: String::from_utf8_lossy(raw).into_owned(),
                truncated: false,
                total_bytes,
            };
        }
        // The cut may land inside a UTF-8 sequence; lossy decoding turns
        // the torn tail into a replacement character.
        let mut text = String::from_utf8_lossy(&raw[..cap]).into_owned();
        text.push_str("\n[output truncated]");
        Self {
            text,
            truncated: true,
            total_bytes,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Size of the captured output before any truncation.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Terminal result of one check invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Which file population the check ran against.
    pub scope: CheckScope,
    /// Whether every validated file passed.
    pub passed: bool,
    /// Captured tool output.
    pub diagnostics: Diagnostics,
}

impl CheckOutcome {
    /// Outcome synthesized when no category called for a check.
    pub fn skipped() -> Self {
        Self {
            scope: CheckScope::Skipped,
            passed: true,
            diagnostics: Diagnostics::empty(),
        }
    }
}

/// Terminal status recorded for one job run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The selected check passed, or no check was called for.
    Success,
    /// The check found violations or the check step aborted.
    Failure,
    /// The run was terminated externally before completion.
    Cancelled,
}

impl JobStatus {
    /// Scalar form written into the status slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the scalar form. Anything else is `None`.
    pub fn from_scalar(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(JobStatus::Success),
            "failure" => Some(JobStatus::Failure),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single durable record a run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobResult {
    /// Job name scoping the status slot.
    pub job_name: String,
    /// Terminal status of the run.
    pub status: JobStatus,
}
