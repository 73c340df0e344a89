//! Save detection for snapkeep.
//!
//! Watches the working file for writes and asks the snapshot store for a
//! capture once per debounce window.

mod monitor;

pub use monitor::{FileMonitor, MonitorConfig, MonitorError};
