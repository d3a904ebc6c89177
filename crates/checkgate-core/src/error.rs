//! Error taxonomy for check orchestration.
//!
//! Errors are grouped by lifecycle stage: loading the upstream change
//! signal ([`ChangeSetError`]), invoking the external check tool
//! ([`ToolError`]), persisting job status ([`RecordError`]), and the
//! orchestrator-level roll-up ([`GateError`]).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the upstream change signal.
#[derive(Debug, Error)]
pub enum ChangeSetError {
    #[error("change set input must be a JSON object")]
    NotAnObject,

    #[error("category '{key}' has unrecognized flag value '{value}' (expected \"true\" or \"false\")")]
    InvalidFlag { key: String, value: String },

    #[error("file list '{key}' must be an array of strings or a delimited string")]
    InvalidFileList { key: String },

    #[error("invalid change set JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read change set input at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from invoking the external check tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run check tool '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("check tool '{program}' timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("check tool '{program}' was terminated by a signal")]
    Terminated { program: String },

    #[error("scoped check invoked with an empty file list")]
    EmptyFileList,
}

/// Errors from the durable status store.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid job name '{0}': must be a bare file name")]
    InvalidJobName(String),

    #[error("status store failure at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("status slot {path:?} holds unrecognized value '{value}'")]
    Corrupt { path: PathBuf, value: String },
}

/// Errors surfaced by one orchestrated run's check step.
#[derive(Debug, Error)]
pub enum GateError {
    /// A category flag asserted changed files exist, but the list was
    /// empty or missing.
    #[error("category '{category}' is flagged changed but has no associated files")]
    ConfigurationViolation { category: String },

    #[error("change set loading failed: {0}")]
    ChangeSet(#[from] ChangeSetError),

    #[error("check tool invocation failed: {0}")]
    Tool(#[from] ToolError),

    #[error("status recording failed: {0}")]
    Record(#[from] RecordError),
}

/// Result alias for orchestration operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_violation_names_the_category() {
        let err = GateError::ConfigurationViolation {
            category: "repo".to_string(),
        };
        assert!(err.to_string().contains("'repo'"));
        assert!(err.to_string().contains("no associated files"));
    }

    #[test]
    fn tool_error_wraps_into_gate_error() {
        let err: GateError = ToolError::EmptyFileList.into();
        assert!(matches!(err, GateError::Tool(ToolError::EmptyFileList)));
    }

    #[test]
    fn record_error_keeps_the_slot_path() {
        let err = RecordError::Corrupt {
            path: PathBuf::from("exitstatus/lint"),
            value: "maybe".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("exitstatus/lint"));
        assert!(rendered.contains("'maybe'"));
    }
}
