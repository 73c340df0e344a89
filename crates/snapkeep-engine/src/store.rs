//! Snapshot storage: durable, ordered record of captured versions.
//!
//! Disk is ground truth. Every read re-enumerates the snapshot directory,
//! so versions added or removed by external cleanup are picked up without
//! any invalidation protocol. One mutex guards the in-memory history and
//! cursor together; append, cursor moves and full reloads are mutually
//! exclusive.

use crate::error::SnapshotResult;
use crate::hooks::SnapshotHooks;
use crate::restore;
use crate::snapshot::{Snapshot, WorkingFile};
use crate::stamp;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use snapkeep_util::path_key;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Directory component that holds all snapshot trees.
pub const SNAPSHOT_DIR_NAME: &str = ".snapshots";

/// Configuration for snapshot capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum copy attempts per snapshot.
    pub max_attempts: u32,

    /// Delay between copy attempts, in milliseconds. Also slept before
    /// the first attempt so the producing application can finish
    /// flushing.
    pub retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay_ms: 200,
        }
    }
}

impl StoreConfig {
    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) history: Vec<Snapshot>,
    /// Index into `history`; `None` while the history is empty.
    pub(crate) cursor: Option<usize>,
}

/// Durable, ordered record of all snapshots for one working file.
///
/// Snapshots are plain file copies in a flat directory:
/// ```text
/// <workingDir>/.snapshots/<workingBaseName>/
///   20250102_030405.<ext>        # snapshot
///   20250102_030405.png          # optional preview image
/// ```
pub struct SnapshotStore {
    pub(crate) working: WorkingFile,
    snapshot_dir: PathBuf,
    config: StoreConfig,
    pub(crate) hooks: Arc<dyn SnapshotHooks>,
    pub(crate) state: Mutex<StoreState>,
}

impl SnapshotStore {
    /// Open the store for a working file, creating the snapshot directory
    /// if absent and loading whatever history is already on disk.
    pub async fn open(
        working: WorkingFile,
        config: StoreConfig,
        hooks: Arc<dyn SnapshotHooks>,
    ) -> SnapshotResult<Self> {
        let snapshot_dir = working
            .dir()
            .join(SNAPSHOT_DIR_NAME)
            .join(working.base_name());
        fs::create_dir_all(&snapshot_dir).await?;

        let store = Self {
            working,
            snapshot_dir,
            config,
            hooks,
            state: Mutex::new(StoreState::default()),
        };
        store.reload().await;
        Ok(store)
    }

    /// The file this store protects.
    pub fn working(&self) -> &WorkingFile {
        &self.working
    }

    /// Directory holding this working file's snapshots.
    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Rebuild the in-memory history from the snapshot directory and
    /// reset the cursor to the newest entry.
    ///
    /// Enumeration failures are logged and produce an empty history for
    /// this call; they never propagate.
    pub async fn reload(&self) -> Vec<Snapshot> {
        let history = match self.scan_disk().await {
            Ok(list) => list,
            Err(e) => {
                warn!(
                    dir = %self.snapshot_dir.display(),
                    error = %e,
                    "failed to enumerate snapshot directory"
                );
                Vec::new()
            }
        };

        let mut state = self.state.lock().await;
        state.cursor = history.len().checked_sub(1);
        state.history = history.clone();
        history
    }

    /// Ordered history, freshly reconciled with disk.
    pub async fn history(&self) -> Vec<Snapshot> {
        self.reload().await
    }

    async fn scan_disk(&self) -> SnapshotResult<Vec<Snapshot>> {
        let mut found: Vec<Snapshot> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let mut entries = fs::read_dir(&self.snapshot_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }

            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !ext.eq_ignore_ascii_case(self.working.extension()) {
                continue;
            }

            if !seen.insert(path_key(&path)) {
                continue;
            }

            let base = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let Some(timestamp) = stamp::parse(base).or_else(|| stamp::from_metadata(&meta))
            else {
                debug!(path = %path.display(), "no stamp and no usable file time, skipping");
                continue;
            };

            found.push(Snapshot::new(timestamp, path));
        }

        // Stable: discovery order breaks timestamp ties.
        found.sort_by_key(|s| s.timestamp);
        Ok(found)
    }

    /// Capture the working file as a new timestamped snapshot.
    ///
    /// Contention with the producing application (which may still hold
    /// the file) is retried on a fixed delay. Exhaustion and
    /// non-retryable failures abandon the capture: nothing is recorded,
    /// nothing is surfaced to the caller, only logged.
    pub async fn create_snapshot(&self) -> Option<Snapshot> {
        let now = Local::now();
        let dest = self
            .snapshot_dir
            .join(format!("{}.{}", stamp::format(now), self.working.extension()));

        debug!(dest = %dest.display(), "saving snapshot");

        for attempt in 1..=self.config.max_attempts {
            // Same grace before the first attempt as between retries; the
            // producing application may still be flushing.
            tokio::time::sleep(self.config.retry_delay()).await;

            match fs::copy(self.working.path(), &dest).await {
                Ok(_) => {
                    debug!(attempt, dest = %dest.display(), "snapshot copy succeeded");
                    let snapshot = self.record(now, dest).await;
                    self.fire_capture_hooks(&snapshot).await;
                    return Some(snapshot);
                }
                Err(e) if is_retryable(&e) => {
                    debug!(attempt, error = %e, "snapshot copy failed");
                    if attempt == self.config.max_attempts {
                        warn!(
                            dest = %dest.display(),
                            attempts = attempt,
                            "giving up, no snapshot created"
                        );
                        self.discard_partial(&dest).await;
                        return None;
                    }
                }
                Err(e) => {
                    warn!(
                        dest = %dest.display(),
                        error = %e,
                        "unexpected copy error, abandoning snapshot"
                    );
                    self.discard_partial(&dest).await;
                    return None;
                }
            }
        }

        None
    }

    /// Materialize `snapshot` as a new, collision-free copy next to the
    /// working file. Never touches the working file or the history.
    ///
    /// Unlike [`create_snapshot`](Self::create_snapshot), copy failures
    /// propagate: the caller asked for a named artifact and must learn
    /// whether it exists.
    pub async fn restore_as_copy(&self, snapshot: &Snapshot) -> SnapshotResult<PathBuf> {
        let restored = restore::materialize_copy(&self.working, snapshot).await?;

        if let Err(e) = self.hooks.open_in_new_instance(&restored).await {
            debug!(path = %restored.display(), error = %e, "open in new instance failed");
        }
        let preview = snapshot.has_preview().then(|| snapshot.preview_path.clone());
        self.hooks
            .notify("Snapshot restored as copy", &restored, preview.as_deref())
            .await;

        Ok(restored)
    }

    /// Append the snapshot unless its path is already tracked, keep the
    /// history ascending, and point the cursor at the newest entry.
    async fn record(&self, now: DateTime<Local>, dest: PathBuf) -> Snapshot {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.history.iter().find(|s| s.is_at(&dest)) {
            return existing.clone();
        }

        let snapshot = Snapshot::new(now, dest);
        state.history.push(snapshot.clone());
        state.history.sort_by_key(|s| s.timestamp);
        state.cursor = state.history.len().checked_sub(1);
        info!(path = %snapshot.path.display(), "snapshot recorded");
        snapshot
    }

    /// Best-effort preview capture and notification. Failures must not
    /// unwind the recorded snapshot.
    async fn fire_capture_hooks(&self, snapshot: &Snapshot) {
        if let Err(e) = self.hooks.capture_preview(&snapshot.preview_path).await {
            debug!(
                path = %snapshot.preview_path.display(),
                error = %e,
                "preview capture failed"
            );
        }
        let preview = snapshot.has_preview().then(|| snapshot.preview_path.clone());
        self.hooks
            .notify("Snapshot saved", &snapshot.path, preview.as_deref())
            .await;
    }

    /// A failed attempt may leave a half-written destination behind.
    async fn discard_partial(&self, dest: &Path) {
        if let Err(e) = fs::remove_file(dest).await {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(dest = %dest.display(), error = %e, "could not remove partial snapshot");
            }
        }
    }
}

/// Whether a copy failure is the contention class worth retrying: the
/// producing application still holds the file and will let go shortly.
/// Anything else abandons the capture immediately.
fn is_retryable(e: &io::Error) -> bool {
    #[cfg(windows)]
    {
        // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
        if matches!(e.raw_os_error(), Some(32) | Some(33)) {
            return true;
        }
    }

    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoopHooks;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fast_config() -> StoreConfig {
        StoreConfig {
            max_attempts: 10,
            retry_delay_ms: 1,
        }
    }

    async fn setup() -> (TempDir, SnapshotStore) {
        let dir = TempDir::new().unwrap();
        let working_path = dir.path().join("job.e12");
        fs::write(&working_path, b"v1").await.unwrap();

        let working = WorkingFile::new(&working_path).unwrap();
        let store = SnapshotStore::open(working, fast_config(), Arc::new(NoopHooks))
            .await
            .unwrap();
        (dir, store)
    }

    async fn seed(store: &SnapshotStore, name: &str, contents: &[u8]) {
        fs::write(store.snapshot_dir().join(name), contents)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_snapshot_directory() {
        let (dir, store) = setup().await;
        assert_eq!(
            store.snapshot_dir(),
            dir.path().join(".snapshots").join("job")
        );
        assert!(store.snapshot_dir().is_dir());
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_snapshot_records_copy() {
        let (_dir, store) = setup().await;

        let snapshot = store.create_snapshot().await.expect("snapshot created");
        assert_eq!(fs::read(&snapshot.path).await.unwrap(), b"v1");
        assert_eq!(
            snapshot.preview_path.extension().and_then(|e| e.to_str()),
            Some("png")
        );

        let history = store.history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].is_at(&snapshot.path));
        assert_eq!(store.state.lock().await.cursor, Some(0));
    }

    #[tokio::test]
    async fn test_duplicate_destination_is_idempotent() {
        let (_dir, store) = setup().await;
        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let dest = store.snapshot_dir().join("20250102_030405.e12");
        fs::write(&dest, b"v1").await.unwrap();

        let first = store.record(now, dest.clone()).await;
        let second = store.record(now, dest).await;

        assert_eq!(first.path, second.path);
        assert_eq!(store.state.lock().await.history.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_rebuilds_ascending_from_disk() {
        let (_dir, store) = setup().await;
        // Seed out of name order to prove sorting is by stamp.
        seed(&store, "20250102_000000.e12", b"two").await;
        seed(&store, "20250101_000000.e12", b"one").await;
        seed(&store, "20250103_000000.e12", b"three").await;

        let history = store.reload().await;
        let stamps: Vec<String> = history.iter().map(|s| s.stamp()).collect();
        assert_eq!(
            stamps,
            vec!["20250101_000000", "20250102_000000", "20250103_000000"]
        );
        assert_eq!(store.state.lock().await.cursor, Some(2));

        // Idempotent and order-stable.
        let again = store.reload().await;
        let stamps_again: Vec<String> = again.iter().map(|s| s.stamp()).collect();
        assert_eq!(stamps, stamps_again);
    }

    #[tokio::test]
    async fn test_restart_reconstructs_the_same_order() {
        let (_dir, store) = setup().await;
        seed(&store, "20250101_000000.e12", b"one").await;
        seed(&store, "20250102_000000.e12", b"two").await;
        let snapshot = store.create_snapshot().await.expect("snapshot created");
        let live: Vec<String> = store.history().await.iter().map(|s| s.stamp()).collect();

        // A fresh store over the same working file sees the same history.
        let reopened =
            SnapshotStore::open(store.working().clone(), fast_config(), Arc::new(NoopHooks))
                .await
                .unwrap();
        let rebuilt: Vec<String> = reopened.history().await.iter().map(|s| s.stamp()).collect();

        assert_eq!(live, rebuilt);
        assert_eq!(rebuilt.len(), 3);
        assert!(rebuilt.contains(&snapshot.stamp()));
    }

    #[tokio::test]
    async fn test_reload_ignores_other_extensions() {
        let (_dir, store) = setup().await;
        seed(&store, "20250101_000000.e12", b"snap").await;
        seed(&store, "20250101_000000.png", b"preview").await;
        seed(&store, "notes.txt", b"unrelated").await;

        let history = store.reload().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].stamp(), "20250101_000000");
    }

    #[tokio::test]
    async fn test_reload_matches_extension_case_insensitively() {
        let (_dir, store) = setup().await;
        seed(&store, "20250101_000000.E12", b"snap").await;

        assert_eq!(store.reload().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_name_falls_back_to_file_time() {
        let (_dir, store) = setup().await;
        seed(&store, "hand-copied.e12", b"old").await;

        let history = store.reload().await;
        assert_eq!(history.len(), 1);
        // Dated by file time, which is roughly now.
        let delta = Local::now().signed_duration_since(history[0].timestamp);
        assert!(delta.num_seconds().abs() < 60);
    }

    #[tokio::test]
    async fn test_missing_working_file_abandons_without_recording() {
        let (_dir, store) = setup().await;
        fs::remove_file(store.working().path()).await.unwrap();

        assert!(store.create_snapshot().await.is_none());
        assert!(store.history().await.is_empty());

        let mut entries = fs::read_dir(store.snapshot_dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_locked_source_exhausts_retries_quietly() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = setup().await;
        let src = store.working().path().to_path_buf();
        std::fs::set_permissions(&src, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::File::open(&src).is_ok() {
            // Running privileged; permission bits don't bite, nothing to test.
            return;
        }

        assert!(store.create_snapshot().await.is_none());
        assert!(store.history().await.is_empty());

        // No destination file left behind.
        let mut entries = fs::read_dir(store.snapshot_dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_dir_is_empty_history_not_error() {
        let (_dir, store) = setup().await;
        fs::remove_dir_all(store.snapshot_dir()).await.unwrap();

        assert!(store.history().await.is_empty());
        assert_eq!(store.state.lock().await.cursor, None);
    }

    #[test]
    fn test_is_retryable_classification() {
        assert!(is_retryable(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
        assert!(is_retryable(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_retryable(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(!is_retryable(&io::Error::from(io::ErrorKind::InvalidInput)));
    }
}
