//! # Deployment Repository Synchronizer
//!
//! This module owns the identity of the working directory as a clone of the
//! one configured deployment repository remote.
//!
//! ## Design
//!
//! Git itself is reached through the [`GitOperations`] trait. The default
//! implementation, [`crate::git::SystemGit`], wraps the system `git`
//! command; tests inject mock implementations to simulate clones, remotes
//! and pulls without network access.
//!
//! [`DeploymentRepository`] moves through three states:
//!
//! ```text
//! Empty --clone/open--> Opened --pull--> Synced
//! ```
//!
//! Every pull and push is preceded by [`DeploymentRepository::validate`]:
//! the working directory must contain `inventory/classes` and have a remote
//! whose URL equals the configured one (ignoring case). This keeps gosh from
//! writing into an unrelated git checkout.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::auth::GitAuth;
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::SystemGit;
use crate::inventory::Inventory;

/// Result of a fast-forward pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    Updated,
}

/// Commit identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            name: defaults::COMMIT_AUTHOR_NAME.to_string(),
            email: defaults::COMMIT_AUTHOR_EMAIL.to_string(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Trait for git operations - allows mocking in tests
pub trait GitOperations {
    /// Clone `url` into `target_dir` with depth 1.
    fn clone_shallow(&self, url: &str, target_dir: &Path, auth: &GitAuth) -> Result<()>;

    /// Whether `dir` is a git working copy.
    fn is_repository(&self, dir: &Path) -> bool;

    /// Every URL of every remote configured in `dir`.
    fn remote_urls(&self, dir: &Path) -> Result<Vec<String>>;

    /// Fast-forward pull with depth 1.
    fn pull(&self, dir: &Path, auth: &GitAuth) -> Result<PullOutcome>;

    /// Stage all changes and commit them. Returns false when there was
    /// nothing to commit.
    fn commit_all(&self, dir: &Path, message: &str, author: &Signature) -> Result<bool>;

    /// Push the current branch to its upstream.
    fn push(&self, dir: &Path, auth: &GitAuth) -> Result<()>;
}

/// Synchronization state of the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing opened or cloned yet.
    Empty,
    /// A git working copy is open.
    Opened,
    /// The working copy was pulled from the remote during this run.
    Synced,
}

/// The working directory as a clone of the configured remote.
pub struct DeploymentRepository {
    url: String,
    auth: GitAuth,
    working_dir: PathBuf,
    git: Box<dyn GitOperations>,
    state: SyncState,
}

impl fmt::Debug for DeploymentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRepository")
            .field("url", &self.url)
            .field("auth", &self.auth)
            .field("working_dir", &self.working_dir)
            .field("state", &self.state)
            .finish()
    }
}

impl DeploymentRepository {
    /// Creates a repository handle using the system `git` command.
    pub fn new(url: impl Into<String>, auth: GitAuth, working_dir: impl Into<PathBuf>) -> Self {
        Self::with_operations(url, auth, working_dir, Box::new(SystemGit))
    }

    /// Creates a repository handle with a custom `GitOperations`
    /// implementation.
    pub fn with_operations(
        url: impl Into<String>,
        auth: GitAuth,
        working_dir: impl Into<PathBuf>,
        git: Box<dyn GitOperations>,
    ) -> Self {
        Self {
            url: url.into(),
            auth,
            working_dir: working_dir.into(),
            git,
            state: SyncState::Empty,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The inventory inside the working directory.
    pub fn inventory(&self) -> Inventory {
        Inventory::new(&self.working_dir)
    }

    /// Clone the remote when the working directory is empty, otherwise open
    /// and validate it.
    pub fn open_or_clone(&mut self) -> Result<()> {
        if is_dir_empty(&self.working_dir)? {
            debug!("Working directory {} is empty", self.working_dir.display());
            self.clone_remote()
        } else {
            self.open()
        }
    }

    /// Open an existing working copy and validate its identity.
    pub fn open(&mut self) -> Result<()> {
        if is_dir_empty(&self.working_dir)? {
            return Err(Error::WorkingDirEmpty {
                path: self.working_dir.clone(),
            });
        }
        if !self.git.is_repository(&self.working_dir) {
            return Err(self.invalid("not a git working copy"));
        }
        self.validate()?;
        debug!("Opened deployment repository {}", self.working_dir.display());
        self.state = SyncState::Opened;
        Ok(())
    }

    /// Shallow clone the remote into the (empty) working directory.
    ///
    /// The clone is not validated, so an empty remote can be scaffolded
    /// afterwards.
    pub fn clone_remote(&mut self) -> Result<()> {
        if !is_dir_empty(&self.working_dir)? {
            return Err(Error::WorkingDirNotEmpty {
                path: self.working_dir.clone(),
            });
        }
        fs::create_dir_all(&self.working_dir).map_err(|source| Error::FileIo {
            path: self.working_dir.clone(),
            source,
        })?;
        info!(
            "Cloning deployment repo {} into {}",
            self.url,
            self.working_dir.display()
        );
        self.git
            .clone_shallow(&self.url, &self.working_dir, &self.auth)?;
        self.state = SyncState::Opened;
        Ok(())
    }

    /// Check the inventory layout and that a remote URL matches the
    /// configured one.
    pub fn validate(&self) -> Result<()> {
        if !self.inventory().has_layout() {
            return Err(self.invalid("missing inventory/classes folder"));
        }
        let remotes = self.git.remote_urls(&self.working_dir)?;
        if !remotes.iter().any(|r| r.eq_ignore_ascii_case(&self.url)) {
            return Err(self.invalid(&format!(
                "no remote points to {} (found: {})",
                self.url,
                if remotes.is_empty() {
                    "none".to_string()
                } else {
                    remotes.join(", ")
                }
            )));
        }
        Ok(())
    }

    /// Fast-forward the working copy; being up to date is success.
    pub fn pull(&mut self) -> Result<PullOutcome> {
        if self.state == SyncState::Empty {
            return Err(Error::WorkingDirEmpty {
                path: self.working_dir.clone(),
            });
        }
        self.validate()?;
        let outcome = self
            .git
            .pull(&self.working_dir, &self.auth)
            .map_err(|e| e.context("Error updating working dir with remote"))?;
        match outcome {
            PullOutcome::UpToDate => debug!("Deployment repository already up to date"),
            PullOutcome::Updated => info!("Pulled changes from {}", self.url),
        }
        self.state = SyncState::Synced;
        Ok(outcome)
    }

    /// Commit every change in the working directory and push it.
    ///
    /// Returns false, without pushing, when there was nothing to commit.
    pub fn commit_and_push(&mut self, message: Option<&str>) -> Result<bool> {
        self.validate()?;
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults::COMMIT_MESSAGE);
        let committed = self
            .git
            .commit_all(&self.working_dir, message, &Signature::default())?;
        if !committed {
            info!("No changes to commit in {}", self.working_dir.display());
            return Ok(false);
        }
        self.git
            .push(&self.working_dir, &self.auth)
            .map_err(|e| e.context("error pushing changes"))?;
        info!("Pushed changes to {}", self.url);
        Ok(true)
    }

    fn invalid(&self, message: &str) -> Error {
        Error::InvalidDeploymentRepository {
            path: self.working_dir.clone(),
            message: message.to_string(),
        }
    }
}

/// A directory that does not exist counts as empty.
pub fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(path).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const URL: &str = "https://git.example/deploy.git";

    /// Mock git operations for testing
    #[derive(Default)]
    struct MockGitOperations {
        calls: Arc<Mutex<Vec<String>>>,
        remotes: Vec<String>,
        is_repository: bool,
        pull_outcome: Option<PullOutcome>,
        has_changes: bool,
        scaffold_on_clone: bool,
    }

    impl MockGitOperations {
        fn repository(remote: &str) -> Self {
            Self {
                remotes: vec![remote.to_string()],
                is_repository: true,
                pull_outcome: Some(PullOutcome::UpToDate),
                ..Self::default()
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl GitOperations for MockGitOperations {
        fn clone_shallow(&self, url: &str, target_dir: &Path, _auth: &GitAuth) -> Result<()> {
            self.record(format!("clone {}", url));
            if self.scaffold_on_clone {
                Inventory::new(target_dir).scaffold()?;
            }
            Ok(())
        }

        fn is_repository(&self, _dir: &Path) -> bool {
            self.is_repository
        }

        fn remote_urls(&self, _dir: &Path) -> Result<Vec<String>> {
            Ok(self.remotes.clone())
        }

        fn pull(&self, _dir: &Path, _auth: &GitAuth) -> Result<PullOutcome> {
            self.record("pull".to_string());
            self.pull_outcome.ok_or_else(|| Error::GitCommand {
                command: "pull --ff-only --depth=1".to_string(),
                stderr: "fatal: Not possible to fast-forward, aborting.".to_string(),
            })
        }

        fn commit_all(&self, _dir: &Path, message: &str, author: &Signature) -> Result<bool> {
            self.record(format!("commit {} by {}", message, author));
            Ok(self.has_changes)
        }

        fn push(&self, _dir: &Path, _auth: &GitAuth) -> Result<()> {
            self.record("push".to_string());
            Ok(())
        }
    }

    fn deployment_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        Inventory::new(dir.path()).scaffold().unwrap();
        dir
    }

    fn repo(dir: &Path, git: MockGitOperations) -> (DeploymentRepository, Arc<Mutex<Vec<String>>>) {
        let calls = git.calls.clone();
        (
            DeploymentRepository::with_operations(URL, GitAuth::None, dir, Box::new(git)),
            calls,
        )
    }

    #[test]
    fn test_open_valid_repository() {
        let dir = deployment_dir();
        let (mut repo, _) = repo(dir.path(), MockGitOperations::repository(URL));
        repo.open_or_clone().unwrap();
        assert_eq!(repo.state(), SyncState::Opened);
    }

    #[test]
    fn test_remote_match_ignores_case() {
        let dir = deployment_dir();
        let (mut repo, _) = repo(
            dir.path(),
            MockGitOperations::repository("HTTPS://GIT.EXAMPLE/Deploy.git"),
        );
        repo.open().unwrap();
    }

    #[test]
    fn test_foreign_remote_is_rejected() {
        let dir = deployment_dir();
        let (mut repo, _) = repo(
            dir.path(),
            MockGitOperations::repository("https://git.example/other.git"),
        );
        let err = repo.open_or_clone().unwrap_err();
        assert!(matches!(err, Error::InvalidDeploymentRepository { .. }));
        assert!(format!("{}", err).contains("other.git"));
        assert_eq!(repo.state(), SyncState::Empty);
    }

    #[test]
    fn test_missing_layout_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "not a deployment repo").unwrap();
        let (mut repo, _) = repo(dir.path(), MockGitOperations::repository(URL));
        assert!(matches!(
            repo.open(),
            Err(Error::InvalidDeploymentRepository { .. })
        ));
    }

    #[test]
    fn test_non_git_directory_is_rejected() {
        let dir = deployment_dir();
        let git = MockGitOperations {
            is_repository: false,
            ..MockGitOperations::repository(URL)
        };
        let (mut repo, _) = repo(dir.path(), git);
        assert!(matches!(
            repo.open(),
            Err(Error::InvalidDeploymentRepository { .. })
        ));
    }

    #[test]
    fn test_empty_dir_is_cloned() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("deploy");
        let git = MockGitOperations {
            scaffold_on_clone: true,
            ..MockGitOperations::repository(URL)
        };
        let (mut repo, calls) = repo(&target, git);
        repo.open_or_clone().unwrap();
        assert_eq!(repo.state(), SyncState::Opened);
        assert_eq!(calls.lock().unwrap().as_slice(), [format!("clone {}", URL)]);
        repo.validate().unwrap();
    }

    #[test]
    fn test_open_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        let (mut repo, _) = repo(dir.path(), MockGitOperations::repository(URL));
        assert!(matches!(repo.open(), Err(Error::WorkingDirEmpty { .. })));
    }

    #[test]
    fn test_clone_into_non_empty_dir_fails() {
        let dir = deployment_dir();
        let (mut repo, _) = repo(dir.path(), MockGitOperations::repository(URL));
        assert!(matches!(
            repo.clone_remote(),
            Err(Error::WorkingDirNotEmpty { .. })
        ));
    }

    #[test]
    fn test_pull_up_to_date_is_success() {
        let dir = deployment_dir();
        let (mut repo, _) = repo(dir.path(), MockGitOperations::repository(URL));
        repo.open().unwrap();
        assert_eq!(repo.pull().unwrap(), PullOutcome::UpToDate);
        assert_eq!(repo.state(), SyncState::Synced);
    }

    #[test]
    fn test_pull_failure_propagates() {
        let dir = deployment_dir();
        let git = MockGitOperations {
            pull_outcome: None,
            ..MockGitOperations::repository(URL)
        };
        let (mut repo, _) = repo(dir.path(), git);
        repo.open().unwrap();
        let err = repo.pull().unwrap_err();
        assert!(matches!(err.root(), Error::GitCommand { .. }));
        assert_eq!(repo.state(), SyncState::Opened);
    }

    #[test]
    fn test_pull_before_open_fails() {
        let dir = deployment_dir();
        let (mut repo, calls) = repo(dir.path(), MockGitOperations::repository(URL));
        assert!(matches!(repo.pull(), Err(Error::WorkingDirEmpty { .. })));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_commit_and_push_defaults() {
        let dir = deployment_dir();
        let git = MockGitOperations {
            has_changes: true,
            ..MockGitOperations::repository(URL)
        };
        let (mut repo, calls) = repo(dir.path(), git);
        repo.open().unwrap();
        assert!(repo.commit_and_push(None).unwrap());
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            [
                "commit chore: gosh version changes by gosh <gosh@github.com>".to_string(),
                "push".to_string()
            ]
        );
    }

    #[test]
    fn test_nothing_to_commit_skips_push() {
        let dir = deployment_dir();
        let (mut repo, calls) = repo(dir.path(), MockGitOperations::repository(URL));
        repo.open().unwrap();
        assert!(!repo.commit_and_push(Some("release 1.2")).unwrap());
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["commit release 1.2 by gosh <gosh@github.com>".to_string()]
        );
    }

    #[test]
    fn test_is_dir_empty() {
        let dir = TempDir::new().unwrap();
        assert!(is_dir_empty(dir.path()).unwrap());
        assert!(is_dir_empty(&dir.path().join("missing")).unwrap());
        fs::write(dir.path().join("f"), "").unwrap();
        assert!(!is_dir_empty(dir.path()).unwrap());
    }
}
