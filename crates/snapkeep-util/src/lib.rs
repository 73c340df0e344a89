//! Shared utilities for snapkeep.
//!
//! This crate provides common utilities used across the snapkeep workspace:
//! - Logging setup with tracing
//! - Relative-age labels for timestamps
//! - Path helpers (case-insensitive keys, config directories)

pub mod age;
pub mod log;
pub mod path;

pub use age::age_label;
pub use log::{LogConfig, LogLevel};
pub use path::{path_key, same_path};
