//! Change signal parsing: categorized flags and per-category file lists.
//!
//! The upstream pipeline reports which categories of tracked content
//! changed (JSON object, one boolean per category) and, for categories
//! that track individual paths, a companion `<category>_files` key
//! holding the changed paths. Parsing is strict: a flag must be a
//! boolean or the literal strings `"true"` / `"false"`, anything else
//! fails fast instead of being coerced to false.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChangeSetError;

/// Category covering the check tool's own configuration.
pub const CATEGORY_CHECK_CONFIG: &str = "check-config";
/// Category covering ordinary tracked repository files.
pub const CATEGORY_REPO: &str = "repo";
/// Key suffix marking a per-category file list.
pub const FILES_KEY_SUFFIX: &str = "_files";

/// What kind of run is being orchestrated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// Evaluating a proposed change set before integration.
    ReviewRequest,
    /// Any other cause: direct branch push, schedule, manual dispatch.
    Branch,
}

impl RunTrigger {
    /// True when the run evaluates a proposed change set.
    pub fn is_review_request(&self) -> bool {
        matches!(self, RunTrigger::ReviewRequest)
    }
}

impl std::fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunTrigger::ReviewRequest => write!(f, "review_request"),
            RunTrigger::Branch => write!(f, "branch"),
        }
    }
}

/// Immutable description of what changed upstream.
///
/// Unknown categories are retained but have no effect on check
/// selection; absent categories read as unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Changed flag per category name.
    categories: BTreeMap<String, bool>,
    /// Changed file paths per category name, in upstream order.
    files: BTreeMap<String, Vec<PathBuf>>,
}

impl ChangeSet {
    /// Parse a change set from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ChangeSetError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    /// Read and parse a change set from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ChangeSetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ChangeSetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse a change set from an already decoded JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ChangeSetError> {
        let object = value.as_object().ok_or(ChangeSetError::NotAnObject)?;

        let mut set = ChangeSet::default();
        for (key, entry) in object {
            match key.strip_suffix(FILES_KEY_SUFFIX) {
                Some(category) if !category.is_empty() => {
                    let paths = parse_file_list(key, entry)?;
                    set.files.insert(category.to_string(), paths);
                }
                _ => {
                    let changed = parse_flag(key, entry)?;
                    set.categories.insert(key.clone(), changed);
                }
            }
        }
        Ok(set)
    }

    /// Mark a category changed or unchanged.
    pub fn with_category(mut self, category: &str, changed: bool) -> Self {
        self.categories.insert(category.to_string(), changed);
        self
    }

    /// Attach a file list to a category.
    pub fn with_files(mut self, category: &str, files: Vec<PathBuf>) -> Self {
        self.files.insert(category.to_string(), files);
        self
    }

    /// Whether the named category changed. Absent reads as false.
    pub fn is_changed(&self, category: &str) -> bool {
        self.categories.get(category).copied().unwrap_or(false)
    }

    /// Changed files for the named category, in upstream order.
    pub fn files(&self, category: &str) -> &[PathBuf] {
        self.files.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no category is flagged changed.
    pub fn is_empty(&self) -> bool {
        !self.categories.values().any(|changed| *changed)
    }
}

/// Strict boolean parsing: native booleans and the exact literals
/// `"true"` / `"false"`. No other coercions.
fn parse_flag(key: &str, value: &Value) -> Result<bool, ChangeSetError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(ChangeSetError::InvalidFlag {
            key: key.to_string(),
            value: render_scalar(other),
        }),
    }
}

/// File lists arrive either as a JSON array of strings or as one string
/// with paths separated by whitespace or commas. Empty segments are
/// dropped.
fn parse_file_list(key: &str, value: &Value) -> Result<Vec<PathBuf>, ChangeSetError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(PathBuf::from(s)),
                _ => Err(ChangeSetError::InvalidFileList {
                    key: key.to_string(),
                }),
            })
            .collect(),
        Value::String(s) => Ok(s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|segment| !segment.is_empty())
            .map(PathBuf::from)
            .collect()),
        _ => Err(ChangeSetError::InvalidFileList {
            key: key.to_string(),
        }),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
