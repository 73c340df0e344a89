//! Snapshot data model.

use crate::error::{SnapshotError, SnapshotResult};
use crate::stamp;
use chrono::{DateTime, Local};
use serde::Serialize;
use snapkeep_util::{age_label, path_key};
use std::path::{Path, PathBuf};

/// Extension used for snapshot preview images.
pub const PREVIEW_EXT: &str = "png";

/// The single file under version protection.
///
/// Fixed for the engine's lifetime; protecting a different file means
/// constructing a new engine.
#[derive(Debug, Clone)]
pub struct WorkingFile {
    path: PathBuf,
    dir: PathBuf,
    base_name: String,
    extension: String,
}

impl WorkingFile {
    /// Validate and wrap the path of the file to protect.
    ///
    /// The path must have a containing directory, a base name, and an
    /// extension; all three feed the snapshot naming scheme.
    pub fn new(path: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let path = path.into();

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                SnapshotError::invalid_working_file(&path, "no containing directory")
            })?;

        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SnapshotError::invalid_working_file(&path, "no file name"))?;

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SnapshotError::invalid_working_file(&path, "no file extension"))?;

        Ok(Self {
            path,
            dir,
            base_name,
            extension,
        })
    }

    /// Absolute path of the working file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Containing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name without extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether `candidate` refers to this working file, ignoring case.
    pub fn matches(&self, candidate: &Path) -> bool {
        snapkeep_util::same_path(&self.path, candidate)
    }
}

/// An immutable record of one captured version of the working file.
///
/// Identity is the snapshot path; paths are unique within a store without
/// regard to case. Records are never mutated after creation and the
/// engine never deletes their backing files.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Capture time, local, second precision.
    pub timestamp: DateTime<Local>,
    /// Path of the copied file inside the snapshot directory.
    pub path: PathBuf,
    /// Path the preview image would have; not guaranteed to exist.
    pub preview_path: PathBuf,
    /// Relative age, computed when the record was built.
    pub age: String,
}

impl Snapshot {
    pub(crate) fn new(timestamp: DateTime<Local>, path: PathBuf) -> Self {
        let preview_path = path.with_extension(PREVIEW_EXT);
        let age = age_label(timestamp, Local::now());
        Self {
            timestamp,
            path,
            preview_path,
            age,
        }
    }

    /// Canonical stamp string for this snapshot.
    pub fn stamp(&self) -> String {
        stamp::format(self.timestamp)
    }

    /// Whether the preview image actually exists on disk.
    pub fn has_preview(&self) -> bool {
        self.preview_path.exists()
    }

    /// Case-insensitive identity check on the snapshot path.
    pub fn is_at(&self, path: &Path) -> bool {
        path_key(&self.path) == path_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_working_file_parts() {
        let working = WorkingFile::new("/jobs/export-jig.e12").unwrap();
        assert_eq!(working.path(), Path::new("/jobs/export-jig.e12"));
        assert_eq!(working.dir(), Path::new("/jobs"));
        assert_eq!(working.base_name(), "export-jig");
        assert_eq!(working.extension(), "e12");
    }

    #[test]
    fn test_working_file_rejects_unusable_paths() {
        assert!(WorkingFile::new("no-extension").is_err());
        assert!(WorkingFile::new("/jobs/noext").is_err());
        assert!(WorkingFile::new("/").is_err());
    }

    #[test]
    fn test_working_file_matches_ignores_case() {
        let working = WorkingFile::new("/Jobs/Export.E12").unwrap();
        assert!(working.matches(Path::new("/jobs/export.e12")));
        assert!(!working.matches(Path::new("/jobs/other.e12")));
    }

    #[test]
    fn test_snapshot_stamp_and_preview() {
        let ts = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let snap = Snapshot::new(ts, PathBuf::from("/jobs/.snapshots/job/20250304_050607.e12"));
        assert_eq!(snap.stamp(), "20250304_050607");
        assert_eq!(
            snap.preview_path,
            PathBuf::from("/jobs/.snapshots/job/20250304_050607.png")
        );
        assert!(!snap.has_preview());
    }

    #[test]
    fn test_snapshot_identity_ignores_case() {
        let ts = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let snap = Snapshot::new(ts, PathBuf::from("/a/20250304_050607.E12"));
        assert!(snap.is_at(Path::new("/a/20250304_050607.e12")));
    }
}
