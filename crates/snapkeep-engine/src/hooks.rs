//! Collaborator interfaces invoked around snapshot events.
//!
//! Preview capture, user notification, and control of the producing
//! application are host concerns; the engine only defines the seam.
//! Every call site treats these as best-effort: failures are logged and
//! never affect a recorded snapshot or a completed restore.

use async_trait::async_trait;
use std::path::Path;

/// Hooks fired by the engine around snapshot lifecycle events.
///
/// All methods default to no-ops so implementors opt into the events
/// they care about.
#[async_trait]
pub trait SnapshotHooks: Send + Sync {
    /// Capture a preview image of the producing application to `output`.
    async fn capture_preview(&self, output: &Path) -> anyhow::Result<()> {
        let _ = output;
        Ok(())
    }

    /// Surface a message to the user. Fire-and-forget.
    async fn notify(&self, message: &str, primary: &Path, preview: Option<&Path>) {
        let _ = (message, primary, preview);
    }

    /// Ask the producing application to reload the working file after a
    /// destructive restore.
    async fn reopen_working_file(&self, path: &Path) -> anyhow::Result<()> {
        let _ = path;
        Ok(())
    }

    /// Open a restored copy in a new application instance.
    async fn open_in_new_instance(&self, path: &Path) -> anyhow::Result<()> {
        let _ = path;
        Ok(())
    }
}

/// Hooks implementation that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

#[async_trait]
impl SnapshotHooks for NoopHooks {}
