//! Durable job status recording.
//!
//! One scalar slot per job name at a well-known location. Writes are
//! unconditional and idempotent: re-recording the same status leaves
//! the slot byte-identical, and a partially written slot is never
//! observable because replacement is atomic.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::RecordError;
use crate::outcome::{JobResult, JobStatus};

/// Default directory holding per-job status slots.
pub const DEFAULT_STATUS_DIR: &str = "exitstatus";

/// Durable store holding one terminal status per job name.
pub trait StatusRecorder: Send + Sync {
    /// Persist `result`, overwriting any previous record for the job.
    fn record(&self, result: &JobResult) -> Result<(), RecordError>;

    /// Read a previously recorded status. `Ok(None)` when nothing has
    /// been recorded under this job name.
    fn read(&self, job_name: &str) -> Result<Option<JobStatus>, RecordError>;
}

/// Filesystem-backed recorder.
///
/// Layout: `<dir>/<job_name>` containing `success`, `failure` or
/// `cancelled` plus a trailing newline.
pub struct FsStatusRecorder {
    dir: PathBuf,
}

impl FsStatusRecorder {
    /// Create a recorder rooted at `dir`. Creates the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, RecordError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| RecordError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn slot_path(&self, job_name: &str) -> Result<PathBuf, RecordError> {
        validate_job_name(job_name)?;
        Ok(self.dir.join(job_name))
    }
}

/// Job names become file names, so path-like input is rejected instead
/// of escaping the status directory.
fn validate_job_name(name: &str) -> Result<(), RecordError> {
    let bare = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0');
    if bare {
        Ok(())
    } else {
        Err(RecordError::InvalidJobName(name.to_string()))
    }
}

impl StatusRecorder for FsStatusRecorder {
    fn record(&self, result: &JobResult) -> Result<(), RecordError> {
        let path = self.slot_path(&result.job_name)?;

        // Atomic write: write to temp file in the same directory, then rename.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| RecordError::Io {
            path: path.clone(),
            source,
        })?;
        writeln!(tmp, "{}", result.status.as_str()).map_err(|source| RecordError::Io {
            path: path.clone(),
            source,
        })?;
        tmp.persist(&path).map_err(|e| RecordError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        debug!(job = %result.job_name, status = %result.status, "job status recorded");
        Ok(())
    }

    fn read(&self, job_name: &str) -> Result<Option<JobStatus>, RecordError> {
        let path = self.slot_path(job_name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RecordError::Io { path, source }),
        };

        let value = raw.trim();
        match JobStatus::from_scalar(value) {
            Some(status) => Ok(Some(status)),
            None => Err(RecordError::Corrupt {
                path,
                value: value.to_string(),
            }),
        }
    }
}
