//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and record
//! snippets to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_sample_inventory();
//!     fixture.command().args(["list", "versions", "--stage", "alpha"]).assert().success();
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::records;
    pub use super::TestFixture;
}

/// Record documents of a small deployment repository.
pub mod records {
    /// Group `test` holding app1 and app2.
    pub const GROUP_TEST: &str = r#"classes:
- apps.test.app1
- apps.test.app2
"#;

    /// App with a maven and a docker artifact.
    pub const APP1: &str = r#"parameters:
  app1:
    groupId: com/example
    artifacts:
      maven: "[gosh:repo:maven]/com/example/app1/[gosh:version]/app1.jar"
      docker: "[gosh:repo:docker]/app1:[gosh:version]"
"#;

    /// App with only a docker artifact.
    pub const APP2: &str = r#"parameters:
  app2:
    artifacts:
      docker: "[gosh:repo:docker]/app2:[gosh:version]"
"#;

    /// Stage alpha; app3 has a version but no app document.
    pub const STAGE_ALPHA: &str = r#"parameters:
  alpha:
    app1: 1.0.0
    app2: 2.0.0
    app3: 3.0.0
"#;

    /// Shadow release of stage alpha.
    pub const RELEASE_STAGE_ALPHA: &str = r#"parameters:
  alpha:
    app1:
      version: 1.0.0
    app2:
      version: 2.0.0
    app3:
      version: 3.0.0
"#;

    /// Product release 2024.R1.
    pub const RELEASE_2024_R1: &str = r#"parameters:
  2024.R1:
    app1:
      version: 0.9.0
    app2:
      version: 1.9.0
"#;

    /// Project configuration with artifact repositories and key suffixes.
    pub const PROJECT_CONFIG: &str = r#"artifact_repositories:
  maven:
    default: https://repo.example/released
    alpha: https://repo.example/tested
  docker:
    default: registry.example
output:
  versions_key_suffix: version
"#;
}

/// Names of environment variables that must not leak into the binary.
const ISOLATED_ENV: &[&str] = &[
    "GOSH_WORKING_DIR",
    "GOSH_PLUGIN_DIR",
    "GOSH_REPOSITORY_URL",
    "GOSH_AUTH_TYPE",
    "GOSH_AUTH_USER",
    "GOSH_AUTH_PASS",
    "GOSH_AUTH_PRIVATE_KEY_FILE",
    "GOSH_AUTH_PRIVATE_KEY_PASS",
    "GOSH_OUTPUT_DEFAULT_FORMAT",
    "GOSH_OUTPUT_VERSIONS_KEY_SUFFIX",
    "GOSH_OUTPUT_ARTIFACTS_KEY_SUFFIX",
    "GOSH_ASKPASS_SECRET",
    "RUST_LOG",
];

/// A temporary working directory plus an isolated home directory.
///
/// ```text
/// <temp>/deploy   working directory
/// <temp>/home     HOME of the binary under test
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a fixture with an empty working directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("deploy")
            .create_dir_all()
            .expect("Failed to create working directory");
        temp_dir
            .child("home")
            .create_dir_all()
            .expect("Failed to create home directory");
        Self { temp_dir }
    }

    /// Create the empty inventory folder structure.
    pub fn with_inventory(self) -> Self {
        for dir in [
            "inventory/classes/apps",
            "inventory/classes/stages",
            "inventory/classes/releases/stage",
            "inventory/classes/releases/product",
            "inventory/classes/releases/hotfix",
        ] {
            self.child(dir)
                .create_dir_all()
                .expect("Failed to create inventory folder");
        }
        self
    }

    /// Inventory with group `test` (app1, app2), stage `alpha` with its
    /// shadow release, and release `product/2024.R1`.
    pub fn with_sample_inventory(self) -> Self {
        self.with_inventory()
            .with_file("inventory/classes/apps/test.yml", records::GROUP_TEST)
            .with_file("inventory/classes/apps/test/app1.yml", records::APP1)
            .with_file("inventory/classes/apps/test/app2.yml", records::APP2)
            .with_file("inventory/classes/stages/alpha.yml", records::STAGE_ALPHA)
            .with_file(
                "inventory/classes/releases/stage/alpha.yml",
                records::RELEASE_STAGE_ALPHA,
            )
            .with_file(
                "inventory/classes/releases/product/2024.R1.yml",
                records::RELEASE_2024_R1,
            )
    }

    /// Write `.gosh/config.yml` in the working directory.
    pub fn with_project_config(self, content: &str) -> Self {
        self.with_file(".gosh/config.yml", content)
    }

    /// Write `.gosh/config.yml` in the isolated home directory.
    pub fn with_home_config(self, content: &str) -> Self {
        self.temp_dir
            .child("home/.gosh/config.yml")
            .write_str(content)
            .expect("Failed to write home config");
        self
    }

    /// Add a file relative to the working directory.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// The working directory.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("deploy")
    }

    /// The isolated home directory.
    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    /// A file or folder relative to the working directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(Path::new("deploy").join(path))
    }

    /// Read a file relative to the working directory.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Create a command running in the working directory with an isolated
    /// home and environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("gosh");
        cmd.current_dir(self.path()).env("HOME", self.home());
        for var in ISOLATED_ENV {
            cmd.env_remove(var);
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_layout() {
        let fixture = TestFixture::new().with_sample_inventory();
        assert!(fixture.path().join("inventory/classes/apps/test/app1.yml").exists());
        assert!(fixture.home().is_dir());
    }

    #[test]
    fn test_records_are_valid_yaml() {
        for record in [
            records::GROUP_TEST,
            records::APP1,
            records::APP2,
            records::STAGE_ALPHA,
            records::RELEASE_STAGE_ALPHA,
            records::RELEASE_2024_R1,
            records::PROJECT_CONFIG,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(record).expect("Record should be valid YAML");
        }
    }
}
