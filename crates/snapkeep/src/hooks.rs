//! Collaborator hooks backed by user-configured commands.
//!
//! The engine only defines the collaborator seam; here each seam runs a
//! command from the configuration with `$SNAP_*` variables substituted.
//! Typical wiring captures a window screenshot for previews, posts a
//! desktop notification, or pokes the producing application to reload.

use crate::config::HooksConfig;
use async_trait::async_trait;
use snapkeep_engine::SnapshotHooks;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs configured commands at the engine's collaborator seams.
pub struct CommandHooks {
    config: HooksConfig,
}

impl CommandHooks {
    pub fn new(config: HooksConfig) -> Self {
        Self { config }
    }

    async fn run(&self, command: &[String], vars: &[(&str, String)]) -> anyhow::Result<()> {
        let substituted: Vec<String> = command.iter().map(|arg| substitute(arg, vars)).collect();
        let (program, args) = substituted
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty hook command"))?;

        debug!(program = %program, "executing hook");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            anyhow::bail!(
                "hook exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Substitute `$KEY` and `${KEY}` occurrences in a hook argument.
fn substitute(input: &str, vars: &[(&str, String)]) -> String {
    let mut result = input.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("${{{key}}}"), value);
        result = result.replace(&format!("${key}"), value);
    }
    result
}

#[async_trait]
impl SnapshotHooks for CommandHooks {
    async fn capture_preview(&self, output: &Path) -> anyhow::Result<()> {
        let Some(command) = &self.config.preview_command else {
            return Ok(());
        };
        self.run(command, &[("SNAP_PREVIEW", output.display().to_string())])
            .await
    }

    async fn notify(&self, message: &str, primary: &Path, preview: Option<&Path>) {
        let Some(command) = &self.config.notify_command else {
            return;
        };
        let vars = [
            ("SNAP_MESSAGE", message.to_string()),
            ("SNAP_PATH", primary.display().to_string()),
            (
                "SNAP_PREVIEW",
                preview.map(|p| p.display().to_string()).unwrap_or_default(),
            ),
        ];
        if let Err(e) = self.run(command, &vars).await {
            warn!(error = %e, "notify hook failed");
        }
    }

    async fn reopen_working_file(&self, path: &Path) -> anyhow::Result<()> {
        let Some(command) = &self.config.reopen_command else {
            return Ok(());
        };
        self.run(command, &[("SNAP_PATH", path.display().to_string())])
            .await
    }

    async fn open_in_new_instance(&self, path: &Path) -> anyhow::Result<()> {
        let Some(command) = &self.config.open_command else {
            return Ok(());
        };
        self.run(command, &[("SNAP_PATH", path.display().to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_substitute_variables() {
        let vars = [
            ("SNAP_PATH", "/jobs/a.e12".to_string()),
            ("SNAP_MESSAGE", "saved".to_string()),
        ];
        assert_eq!(substitute("open $SNAP_PATH", &vars), "open /jobs/a.e12");
        assert_eq!(substitute("${SNAP_MESSAGE}!", &vars), "saved!");
        assert_eq!(substitute("no variables", &vars), "no variables");
    }

    #[tokio::test]
    async fn test_unconfigured_hooks_are_noops() {
        let hooks = CommandHooks::new(HooksConfig::default());
        assert!(hooks.capture_preview(Path::new("/tmp/x.png")).await.is_ok());
        assert!(hooks
            .reopen_working_file(Path::new("/tmp/x.e12"))
            .await
            .is_ok());
        hooks.notify("msg", Path::new("/tmp/x.e12"), None).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hook_success_and_failure() {
        let config = HooksConfig {
            reopen_command: Some(vec!["true".to_string()]),
            open_command: Some(vec!["false".to_string()]),
            ..Default::default()
        };
        let hooks = CommandHooks::new(config);

        assert!(hooks
            .reopen_working_file(Path::new("/tmp/x.e12"))
            .await
            .is_ok());
        assert!(hooks
            .open_in_new_instance(Path::new("/tmp/x.e12"))
            .await
            .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hook_substitutes_into_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let marker: PathBuf = dir.path().join("ran.txt");
        let config = HooksConfig {
            preview_command: Some(vec![
                "cp".to_string(),
                "/dev/null".to_string(),
                "$SNAP_PREVIEW".to_string(),
            ]),
            ..Default::default()
        };
        let hooks = CommandHooks::new(config);

        hooks.capture_preview(&marker).await.unwrap();
        assert!(marker.exists());
    }
}
