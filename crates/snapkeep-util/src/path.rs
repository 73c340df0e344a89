//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::path::{Path, PathBuf};

/// Case-insensitive identity key for a path.
///
/// Snapshot identity is the snapshot path, and the on-disk layout was
/// designed for filesystems that compare names without regard to case.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Whether two paths name the same file, ignoring case.
pub fn same_path(a: &Path, b: &Path) -> bool {
    path_key(a) == path_key(b)
}

/// Get the snapkeep configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/snapkeep` if set
/// - `~/.config/snapkeep` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("snapkeep"))
}

/// Get the snapkeep data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/snapkeep` if set
/// - `~/.local/share/snapkeep` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("snapkeep"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_key_ignores_case() {
        assert_eq!(
            path_key(Path::new("/Jobs/Export-Jig.E12")),
            path_key(Path::new("/jobs/export-jig.e12"))
        );
    }

    #[test]
    fn test_same_path() {
        assert!(same_path(
            Path::new("/a/B/file.TXT"),
            Path::new("/a/b/file.txt")
        ));
        assert!(!same_path(
            Path::new("/a/b/file.txt"),
            Path::new("/a/b/other.txt")
        ));
    }

    #[test]
    fn test_config_dir() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("snapkeep"));
    }
}
