//! Background versioning engine for a single working file.
//!
//! snapkeep protects a file edited by an external application that has no
//! undo history of its own. Every detected save is captured as an
//! immutable, timestamped copy under `<workingDir>/.snapshots/<baseName>/`,
//! the ordered history can be walked with undo/redo (destructive restore),
//! and any past version can be materialized as a new collision-free copy
//! without touching the working file.
//!
//! The snapshot directory is the source of truth; the in-memory history is
//! a rebuildable projection that is reconciled with disk on every read.
//!
//! # Example
//!
//! ```no_run
//! use snapkeep_engine::{HistoryCursor, NoopHooks, SnapshotStore, StoreConfig, WorkingFile};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let working = WorkingFile::new("/jobs/export-jig.e12")?;
//! let store = Arc::new(
//!     SnapshotStore::open(working, StoreConfig::default(), Arc::new(NoopHooks)).await?,
//! );
//!
//! // Capture the current contents.
//! let snapshot = store.create_snapshot().await;
//! println!("captured: {snapshot:?}");
//!
//! // Step back to the previous version.
//! let cursor = HistoryCursor::new(Arc::clone(&store));
//! let restored = cursor.undo().await?;
//! println!("restored: {restored:?}");
//! # Ok(())
//! # }
//! ```

mod cursor;
mod error;
mod hooks;
mod restore;
mod snapshot;
pub mod stamp;
mod store;

pub use cursor::HistoryCursor;
pub use error::{SnapshotError, SnapshotResult};
pub use hooks::{NoopHooks, SnapshotHooks};
pub use restore::materialize_copy;
pub use snapshot::{Snapshot, WorkingFile, PREVIEW_EXT};
pub use store::{SnapshotStore, StoreConfig, SNAPSHOT_DIR_NAME};
