//! Debounced save detection for the working file.
//!
//! A notify watcher feeds raw filesystem events into a bounded channel;
//! one worker task owns the debounce state and asks the store for a
//! snapshot when a trigger is accepted. GUI applications tend to emit
//! several write notifications per logical save (temp-file swap, metadata
//! touch, content flush); the gate collapses each burst into one capture
//! while saves spaced more than the window apart still get their own.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use snapkeep_engine::SnapshotStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for save detection.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Minimum spacing between accepted save triggers, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl MonitorConfig {
    fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Errors that can occur while setting up the file monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The underlying watch could not be registered.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Gate that drops triggers arriving inside the debounce window.
///
/// The accepted timestamp advances before the snapshot attempt starts,
/// so a slow copy cannot widen the window.
#[derive(Debug)]
struct DebounceGate {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl DebounceGate {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Accept or drop a trigger observed at `now`.
    fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

/// Watches the working file and captures a snapshot per accepted save.
///
/// Runs until [`FileMonitor::shutdown`] or drop; dropping unregisters
/// the OS watch and orphans the worker, which then drains and exits.
pub struct FileMonitor {
    shutdown: Option<oneshot::Sender<()>>,
    worker: JoinHandle<()>,
    _watcher: RecommendedWatcher,
}

impl FileMonitor {
    /// Start watching the store's working file.
    ///
    /// The parent directory is watched rather than the file itself so
    /// editors that save through a rename are still observed; events are
    /// filtered back down to the working file's path.
    pub fn spawn(store: Arc<SnapshotStore>, config: MonitorConfig) -> Result<Self, MonitorError> {
        let working = store.working().clone();
        let watch_dir = working.dir().to_path_buf();

        let (event_tx, event_rx) = mpsc::channel(64);
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(error = %e, "watch error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                if event.paths.iter().any(|p| working.matches(p)) {
                    // Overflow just drops extras of a burst; the debounce
                    // would discard them anyway.
                    let _ = event_tx.try_send(());
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        info!(file = %store.working().path().display(), "watching for saves");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let gate = DebounceGate::new(config.debounce());
        let worker = tokio::spawn(run(store, event_rx, shutdown_rx, gate));

        Ok(Self {
            shutdown: Some(shutdown_tx),
            worker,
            _watcher: watcher,
        })
    }

    /// Stop watching and wait for the worker to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.worker).await;
    }
}

async fn run(
    store: Arc<SnapshotStore>,
    mut events: mpsc::Receiver<()>,
    mut shutdown: oneshot::Receiver<()>,
    mut gate: DebounceGate,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("file monitor shutting down");
                break;
            }
            event = events.recv() => {
                let Some(()) = event else { break };
                if !gate.accept(Instant::now()) {
                    debug!("save event dropped, inside debounce window");
                    continue;
                }
                store.create_snapshot().await;
            }
        }
    }
}
