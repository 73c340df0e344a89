//! Configuration management for snapkeep.
//!
//! Configuration is loaded from multiple sources and merged, later wins:
//! 1. Global config: `~/.config/snapkeep/config.json`
//! 2. Project config: `snapkeep.json` in the current directory
//! 3. CLI flags

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snapkeep_engine::StoreConfig;
use snapkeep_watch::MonitorConfig;
use std::path::{Path, PathBuf};

/// Project-local configuration file name.
pub const PROJECT_FILE: &str = "snapkeep.json";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File to protect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Minimum spacing between accepted save triggers, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    /// Maximum copy attempts per snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Delay between copy attempts, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// Collaborator commands fired around snapshot events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksConfig>,
}

/// Commands to run at collaborator seams. Each is a program plus
/// arguments; `$SNAP_*` variables are substituted before execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Capture a preview image; `$SNAP_PREVIEW` is the output path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_command: Option<Vec<String>>,

    /// Surface a message; gets `$SNAP_MESSAGE`, `$SNAP_PATH` and
    /// `$SNAP_PREVIEW` (empty when no preview exists).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_command: Option<Vec<String>>,

    /// Ask the application to reload the working file; `$SNAP_PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopen_command: Option<Vec<String>>,

    /// Open a restored copy in a new instance; `$SNAP_PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_command: Option<Vec<String>>,
}

impl Config {
    /// Load and merge global then project configuration.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut config = Config::default();

        if let Some(global) = snapkeep_util::path::config_dir().map(|d| d.join("config.json")) {
            if let Some(loaded) = Self::read_file(&global)? {
                config.merge(loaded);
            }
        }

        if let Some(loaded) = Self::read_file(&project_dir.join(PROJECT_FILE))? {
            config.merge(loaded);
        }

        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    /// Overlay `other` on top of this configuration.
    pub fn merge(&mut self, other: Config) {
        if other.file.is_some() {
            self.file = other.file;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.debounce_ms.is_some() {
            self.debounce_ms = other.debounce_ms;
        }
        if other.max_attempts.is_some() {
            self.max_attempts = other.max_attempts;
        }
        if other.retry_delay_ms.is_some() {
            self.retry_delay_ms = other.retry_delay_ms;
        }
        if let Some(hooks) = other.hooks {
            let merged = self.hooks.get_or_insert_with(HooksConfig::default);
            if hooks.preview_command.is_some() {
                merged.preview_command = hooks.preview_command;
            }
            if hooks.notify_command.is_some() {
                merged.notify_command = hooks.notify_command;
            }
            if hooks.reopen_command.is_some() {
                merged.reopen_command = hooks.reopen_command;
            }
            if hooks.open_command.is_some() {
                merged.open_command = hooks.open_command;
            }
        }
    }

    /// Store configuration with defaults filled in.
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry_delay_ms = ms;
        }
        config
    }

    /// Monitor configuration with defaults filled in.
    pub fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        config
    }
}
