//! Default values for gosh configuration.
//!
//! This module provides centralized default paths and identities used across
//! commands, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Directory holding gosh settings, both in the home directory and in a
/// deployment repository.
pub const GOSH_DIR: &str = ".gosh";

/// Configuration file name inside [`GOSH_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Import manifest read by the built-in `manifest` importer.
pub const IMPORT_MANIFEST_FILE: &str = "import.yml";

/// Commit message used when `--message` is not given.
pub const COMMIT_MESSAGE: &str = "chore: gosh version changes";

/// Author and committer name of commits made by gosh.
pub const COMMIT_AUTHOR_NAME: &str = "gosh";

/// Author and committer email of commits made by gosh.
pub const COMMIT_AUTHOR_EMAIL: &str = "gosh@github.com";

/// Output format of `gosh list` when neither flag nor config sets one.
pub const OUTPUT_FORMAT: &str = "yaml";

/// Returns `~/.gosh`, or `None` when the home directory is unknown.
pub fn home_gosh_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GOSH_DIR))
}

/// Returns `~/.gosh/config.yml`.
pub fn home_config_file() -> Option<PathBuf> {
    home_gosh_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Returns `<working_dir>/.gosh/config.yml`.
pub fn project_config_file(working_dir: &Path) -> PathBuf {
    working_dir.join(GOSH_DIR).join(CONFIG_FILE)
}

/// Returns `<working_dir>/.gosh/import.yml`.
pub fn import_manifest_file(working_dir: &Path) -> PathBuf {
    working_dir.join(GOSH_DIR).join(IMPORT_MANIFEST_FILE)
}

/// Returns the directory searched for external import plugins.
///
/// Uses `~/.gosh/plugins`, falling back to `.gosh/plugins` in the current
/// directory if the home directory cannot be determined.
///
/// This can be overridden by the `--plugin-dir` flag or the
/// `GOSH_PLUGIN_DIR` environment variable.
pub fn plugin_dir() -> PathBuf {
    home_gosh_dir()
        .unwrap_or_else(|| PathBuf::from(GOSH_DIR))
        .join("plugins")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_dir_ends_with_plugins() {
        let dir = plugin_dir();
        assert!(dir.ends_with(".gosh/plugins"));
    }

    #[test]
    fn test_project_files() {
        let wd = Path::new("/work/deploy");
        assert_eq!(
            project_config_file(wd),
            PathBuf::from("/work/deploy/.gosh/config.yml")
        );
        assert_eq!(
            import_manifest_file(wd),
            PathBuf::from("/work/deploy/.gosh/import.yml")
        );
    }

    #[test]
    fn test_home_config_file_is_absolute_when_known() {
        if let Some(file) = home_config_file() {
            assert!(file.is_absolute());
            assert!(file.ends_with(".gosh/config.yml"));
        }
    }
}
