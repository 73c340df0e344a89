//! Engine error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while managing snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The working file path cannot be used.
    #[error("invalid working file {}: {reason}", .path.display())]
    InvalidWorkingFile { path: PathBuf, reason: String },

    /// A snapshot's backing file is gone.
    #[error("snapshot file missing: {}", .0.display())]
    SnapshotMissing(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SnapshotError {
    /// Create an invalid-working-file error.
    pub fn invalid_working_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidWorkingFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a snapshot-missing error.
    pub fn snapshot_missing(path: impl Into<PathBuf>) -> Self {
        Self::SnapshotMissing(path.into())
    }
}
