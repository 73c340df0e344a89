//! Sequential navigation over the snapshot history.

use crate::error::SnapshotResult;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Undo/redo navigator with destructive restore semantics.
///
/// Restore overwrites the working file's bytes with the selected
/// snapshot's bytes; it is the only engine operation that mutates the
/// working file. Cursor moves share the store's critical section with
/// appends and reloads.
pub struct HistoryCursor {
    store: Arc<SnapshotStore>,
}

impl HistoryCursor {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Step back one snapshot and restore it onto the working file.
    ///
    /// Returns `Ok(None)` without side effects when there is no history
    /// or the cursor is already at the oldest entry.
    pub async fn undo(&self) -> SnapshotResult<Option<Snapshot>> {
        let target = {
            let mut state = self.store.state.lock().await;
            match state.cursor {
                None | Some(0) => return Ok(None),
                Some(i) => {
                    state.cursor = Some(i - 1);
                    state.history[i - 1].clone()
                }
            }
        };
        self.restore(&target).await?;
        Ok(Some(target))
    }

    /// Step forward one snapshot and restore it onto the working file.
    ///
    /// Returns `Ok(None)` without side effects when there is no history
    /// or the cursor is already at the newest entry.
    pub async fn redo(&self) -> SnapshotResult<Option<Snapshot>> {
        let target = {
            let mut state = self.store.state.lock().await;
            let len = state.history.len();
            match state.cursor {
                Some(i) if i + 1 < len => {
                    state.cursor = Some(i + 1);
                    state.history[i + 1].clone()
                }
                _ => return Ok(None),
            }
        };
        self.restore(&target).await?;
        Ok(Some(target))
    }

    /// Current cursor position; `None` while the history is empty.
    pub async fn position(&self) -> Option<usize> {
        self.store.state.lock().await.cursor
    }

    async fn restore(&self, snapshot: &Snapshot) -> SnapshotResult<()> {
        fs::copy(&snapshot.path, self.store.working.path()).await?;
        info!(snapshot = %snapshot.path.display(), "restored onto working file");

        if let Err(e) = self
            .store
            .hooks
            .reopen_working_file(self.store.working.path())
            .await
        {
            debug!(error = %e, "reopen after restore failed");
        }
        let preview = snapshot.has_preview().then(|| snapshot.preview_path.clone());
        self.store
            .hooks
            .notify("Snapshot restored", &snapshot.path, preview.as_deref())
            .await;

        Ok(())
    }
}
