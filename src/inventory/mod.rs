//! # Inventory Entities
//!
//! The four record kinds stored in a deployment repository and the path
//! conventions that place them on disk:
//!
//! ```text
//! inventory/classes/apps/<group>.yml          app group index
//! inventory/classes/apps/<group>/<app>.yml    app
//! inventory/classes/stages/<stage>.yml        stage
//! inventory/classes/releases/<type>/<name>.yml
//! .gosh/templates/<name>.yml                  app templates
//! ```
//!
//! Every entity is constructed against an [`Inventory`], an explicit handle on
//! the working directory. Entities are plain request-scoped values: build,
//! optionally read and mutate, optionally persist, then drop.

mod app;
mod app_group;
mod release;
mod stage;
pub mod template;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::document::RECORD_EXTENSION;
use crate::error::{Error, Result};

pub use app::App;
pub use app_group::AppGroup;
pub use release::{Release, ReleaseType};
pub use stage::Stage;
pub use template::AppTemplate;

/// Root of all inventory classes, relative to the working directory.
pub const CLASSES_PATH: &str = "inventory/classes";
/// Folder holding app groups and apps.
pub const APPS_FOLDER: &str = "apps";
/// Folder holding stages.
pub const STAGES_FOLDER: &str = "stages";
/// Folder holding releases, one subfolder per release type.
pub const RELEASES_FOLDER: &str = "releases";
/// Class prefix used in group index documents (`apps.<group>.<app>`).
pub const APP_CLASS_PREFIX: &str = "apps";

/// Handle on the working directory that holds the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    root: PathBuf,
}

impl Inventory {
    /// Create an inventory rooted at a deployment repository working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `inventory/classes` under the working directory.
    pub fn classes_dir(&self) -> PathBuf {
        self.root.join(CLASSES_PATH)
    }

    /// Folder containing group indexes and group folders.
    pub fn apps_dir(&self) -> PathBuf {
        self.classes_dir().join(APPS_FOLDER)
    }

    /// Folder containing stage documents.
    pub fn stages_dir(&self) -> PathBuf {
        self.classes_dir().join(STAGES_FOLDER)
    }

    /// Folder containing the release documents of one type.
    pub fn releases_dir(&self, release_type: ReleaseType) -> PathBuf {
        self.classes_dir()
            .join(RELEASES_FOLDER)
            .join(release_type.as_str())
    }

    /// Folder containing user-defined app templates.
    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(crate::defaults::GOSH_DIR).join("templates")
    }

    /// Whether the expected inventory folder structure is present.
    pub fn has_layout(&self) -> bool {
        self.classes_dir().is_dir()
    }

    /// Create the inventory folder structure, leaving existing content alone.
    pub fn scaffold(&self) -> Result<()> {
        let mut dirs = vec![self.apps_dir(), self.stages_dir(), self.templates_dir()];
        dirs.extend(ReleaseType::ALL.iter().map(|t| self.releases_dir(*t)));
        for dir in dirs {
            debug!("Creating inventory folder {}", dir.display());
            fs::create_dir_all(&dir).map_err(|source| Error::FileIo { path: dir, source })?;
        }
        Ok(())
    }

    /// Names of every stage document in the inventory, sorted.
    pub fn stage_names(&self) -> Result<Vec<String>> {
        record_names(&self.stages_dir())
    }

    /// Names of every release of the given type, sorted.
    pub fn release_names(&self, release_type: ReleaseType) -> Result<Vec<String>> {
        record_names(&self.releases_dir(release_type))
    }

    /// Names of every app group, sorted.
    pub fn group_names(&self) -> Result<Vec<String>> {
        record_names(&self.apps_dir())
    }
}

/// `<dir>/<name>.yml`
pub(crate) fn record_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, RECORD_EXTENSION))
}

fn record_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| Error::FileIo {
        path: dir.to_path_buf(),
        source,
    })? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_scaffold_creates_layout() {
        let (_temp, inventory) = inventory();
        assert!(inventory.has_layout());
        assert!(inventory.apps_dir().is_dir());
        assert!(inventory.stages_dir().is_dir());
        for release_type in ReleaseType::ALL {
            assert!(inventory.releases_dir(release_type).is_dir());
        }
        assert!(inventory.templates_dir().is_dir());
    }

    #[test]
    fn test_scaffold_is_repeatable() {
        let (_temp, inventory) = inventory();
        write(&inventory, "inventory/classes/stages/alpha.yml", STAGE_ALPHA);
        inventory.scaffold().unwrap();
        assert_eq!(inventory.stage_names().unwrap(), vec!["alpha"]);
    }

    #[test]
    fn test_record_names_ignore_folders_and_other_files() {
        let (_temp, inventory) = inventory();
        with_test_group(&inventory);
        write(&inventory, "inventory/classes/apps/README.md", "docs");
        assert_eq!(inventory.group_names().unwrap(), vec!["test"]);
    }

    #[test]
    fn test_record_names_missing_dir_is_empty() {
        let inventory = Inventory::new("/nonexistent/gosh/inventory");
        assert!(inventory.stage_names().unwrap().is_empty());
    }
}
