//! Non-destructive restore: materialize a snapshot as a fresh copy.

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{Snapshot, WorkingFile};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Copy `snapshot` into the working directory under a collision-free
/// `<base>_restored_<stamp>[_N].<ext>` name and return the path used.
///
/// Existing files are never overwritten; on a name collision the numeric
/// suffix increments until a free name is found. The working file and
/// the history are untouched.
pub async fn materialize_copy(
    working: &WorkingFile,
    snapshot: &Snapshot,
) -> SnapshotResult<PathBuf> {
    if !fs::try_exists(&snapshot.path).await.unwrap_or(false) {
        return Err(SnapshotError::snapshot_missing(&snapshot.path));
    }

    let base = format!("{}_restored_{}", working.base_name(), snapshot.stamp());
    let ext = working.extension();

    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{base}.{ext}")
        } else {
            format!("{base}_{suffix}.{ext}")
        };
        let candidate = working.dir().join(name);

        match copy_without_overwrite(&snapshot.path, &candidate).await {
            Ok(_) => {
                info!(path = %candidate.display(), "snapshot restored as copy");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                suffix += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Byte copy that refuses to replace an existing destination.
async fn copy_without_overwrite(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = fs::File::open(src).await?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await?;

    match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => {
            writer.flush().await?;
            Ok(bytes)
        }
        Err(e) => {
            // Don't leave a partial artifact with the reserved name.
            drop(writer);
            let _ = fs::remove_file(dest).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, WorkingFile, Snapshot) {
        let dir = TempDir::new().unwrap();
        let working_path = dir.path().join("job.e12");
        fs::write(&working_path, b"current").await.unwrap();
        let working = WorkingFile::new(&working_path).unwrap();

        let snap_dir = dir.path().join(".snapshots").join("job");
        fs::create_dir_all(&snap_dir).await.unwrap();
        let snap_path = snap_dir.join("20250101_000000.e12");
        fs::write(&snap_path, b"older").await.unwrap();

        let ts = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let snapshot = Snapshot::new(ts, snap_path);
        (dir, working, snapshot)
    }

    #[tokio::test]
    async fn test_materialize_copy_uses_restored_name() {
        let (dir, working, snapshot) = setup().await;

        let restored = materialize_copy(&working, &snapshot).await.unwrap();
        assert_eq!(
            restored,
            dir.path().join("job_restored_20250101_000000.e12")
        );
        assert_eq!(fs::read(&restored).await.unwrap(), b"older");
        // Working file untouched.
        assert_eq!(fs::read(working.path()).await.unwrap(), b"current");
    }

    #[tokio::test]
    async fn test_materialize_copy_never_overwrites() {
        let (dir, working, snapshot) = setup().await;

        let first = materialize_copy(&working, &snapshot).await.unwrap();
        let second = materialize_copy(&working, &snapshot).await.unwrap();
        let third = materialize_copy(&working, &snapshot).await.unwrap();

        assert_eq!(
            second,
            dir.path().join("job_restored_20250101_000000_1.e12")
        );
        assert_eq!(
            third,
            dir.path().join("job_restored_20250101_000000_2.e12")
        );
        // The first copy is intact.
        assert_eq!(fs::read(&first).await.unwrap(), b"older");
    }

    #[tokio::test]
    async fn test_materialize_copy_fails_for_missing_snapshot() {
        let (_dir, working, snapshot) = setup().await;
        fs::remove_file(&snapshot.path).await.unwrap();

        let result = materialize_copy(&working, &snapshot).await;
        assert!(matches!(result, Err(SnapshotError::SnapshotMissing(_))));
    }
}
