//! Check selection policy.
//!
//! One total function maps the run's inputs to exactly one plan, so
//! branch exclusivity is structural rather than an emergent property of
//! separate conditionals evaluated independently.

use std::path::PathBuf;

use crate::changeset::{ChangeSet, RunTrigger, CATEGORY_CHECK_CONFIG, CATEGORY_REPO};
use crate::error::GateError;

/// The single check invocation (or absence of one) selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckPlan {
    /// Validate the tool's whole configured corpus.
    All,
    /// Validate exactly these paths, in upstream order.
    Scoped(Vec<PathBuf>),
    /// No category calls for a check.
    Skip,
}

impl CheckPlan {
    /// Number of explicitly targeted files. Zero for `All` and `Skip`.
    pub fn file_count(&self) -> usize {
        match self {
            CheckPlan::Scoped(files) => files.len(),
            _ => 0,
        }
    }
}

/// Select the check plan for one run. Exactly one branch fires:
///
/// 1. `All` for every non-review run, and for review runs where the
///    check configuration itself changed. A scoped pass cannot tell
///    whether new configuration breaks files outside the change set.
/// 2. `Scoped` for review runs where ordinary tracked files changed.
///    The `repo` flag asserts changed files exist, so an empty or
///    missing list is a [`GateError::ConfigurationViolation`].
/// 3. `Skip` otherwise.
pub fn select_plan(trigger: RunTrigger, changes: &ChangeSet) -> Result<CheckPlan, GateError> {
    if !trigger.is_review_request() || changes.is_changed(CATEGORY_CHECK_CONFIG) {
        return Ok(CheckPlan::All);
    }

    if changes.is_changed(CATEGORY_REPO) {
        let files = changes.files(CATEGORY_REPO);
        if files.is_empty() {
            return Err(GateError::ConfigurationViolation {
                category: CATEGORY_REPO.to_string(),
            });
        }
        return Ok(CheckPlan::Scoped(files.to_vec()));
    }

    Ok(CheckPlan::Skip)
}
