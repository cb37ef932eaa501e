//! System `git` invocations used by the repository synchronizer.
//!
//! Everything goes through the `git` binary, so the user's git setup (ssh
//! agent, credential helpers, `~/.gitconfig`) applies unless gosh was
//! configured with explicit credentials, which are passed per command
//! through the environment:
//!
//! - basic auth: an `Authorization` header via `GIT_CONFIG_*` variables
//! - ssh key: `GIT_SSH_COMMAND` with the key, plus an askpass helper for
//!   the passphrase

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Output};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, trace};

use crate::auth::{GitAuth, ASKPASS_SECRET_ENV};
use crate::error::{Error, Result};
use crate::repository::{GitOperations, PullOutcome, Signature};

/// [`GitOperations`] backed by the system `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn clone_shallow(&self, url: &str, target_dir: &Path, auth: &GitAuth) -> Result<()> {
        clone_shallow(url, target_dir, auth)
    }

    fn is_repository(&self, dir: &Path) -> bool {
        git(Some(dir), &GitAuth::None)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
            .unwrap_or(false)
    }

    fn remote_urls(&self, dir: &Path) -> Result<Vec<String>> {
        let output = run(dir, &GitAuth::None, &["remote", "-v"])?;
        Ok(parse_remote_urls(&String::from_utf8_lossy(&output.stdout)))
    }

    fn pull(&self, dir: &Path, auth: &GitAuth) -> Result<PullOutcome> {
        let output = run(dir, auth, &["pull", "--ff-only", "--depth=1"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if is_up_to_date(&stdout) {
            Ok(PullOutcome::UpToDate)
        } else {
            Ok(PullOutcome::Updated)
        }
    }

    fn commit_all(&self, dir: &Path, message: &str, author: &Signature) -> Result<bool> {
        run(dir, &GitAuth::None, &["add", "--all"])?;
        let status = run(dir, &GitAuth::None, &["status", "--porcelain"])?;
        if status.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(false);
        }

        let mut command = git(Some(dir), &GitAuth::None);
        if !has_identity(dir) {
            trace!("No git identity configured, committing as {}", author);
            command
                .arg("-c")
                .arg(format!("user.name={}", author.name))
                .arg("-c")
                .arg(format!("user.email={}", author.email));
        }
        command.args(["commit", "--quiet", "-m", message]);
        check("commit", command.output())?;
        Ok(true)
    }

    fn push(&self, dir: &Path, auth: &GitAuth) -> Result<()> {
        run(dir, auth, &["push"]).map(|_| ())
    }
}

/// Shallow clone (`--depth=1`) of `url` into `target_dir`.
pub fn clone_shallow(url: &str, target_dir: &Path, auth: &GitAuth) -> Result<()> {
    debug!("Cloning {} into {}", url, target_dir.display());
    let output = git(None, auth)
        .args(["clone", "--depth=1", url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            message: e.to_string(),
            hint: Some("Make sure git is installed and on your PATH".to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let hint = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            Some(
                "Authentication failed. Check the auth section of your gosh configuration \
                 (run 'gosh config'), or make sure your SSH key is added to ssh-agent"
                    .to_string(),
            )
        } else {
            None
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            message: stderr.trim().to_string(),
            hint,
        });
    }

    Ok(())
}

fn git(dir: Option<&Path>, auth: &GitAuth) -> Command {
    let mut command = Command::new("git");
    if let Some(dir) = dir {
        command.arg("-C").arg(dir);
    }
    // Never block on an interactive credential prompt.
    command.env("GIT_TERMINAL_PROMPT", "0");
    match auth {
        GitAuth::None => {}
        GitAuth::Basic { user, password } => {
            let token = STANDARD.encode(format!("{}:{}", user, password));
            command
                .env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env("GIT_CONFIG_VALUE_0", format!("Authorization: Basic {}", token));
        }
        GitAuth::SshKey {
            key_file,
            passphrase,
        } => {
            command.env(
                "GIT_SSH_COMMAND",
                format!("ssh -i '{}' -o IdentitiesOnly=yes", key_file.display()),
            );
            if let Some(passphrase) = passphrase {
                if let Ok(exe) = std::env::current_exe() {
                    command
                        .env("SSH_ASKPASS", exe)
                        .env("SSH_ASKPASS_REQUIRE", "force")
                        .env(ASKPASS_SECRET_ENV, passphrase);
                }
            }
        }
    }
    command
}

fn run(dir: &Path, auth: &GitAuth, args: &[&str]) -> Result<Output> {
    trace!("git -C {} {}", dir.display(), args.join(" "));
    let output = git(Some(dir), auth).args(args).output();
    check(&args.join(" "), output)
}

fn check(command: &str, output: std::io::Result<Output>) -> Result<Output> {
    let output = output.map_err(|e| Error::GitCommand {
        command: command.to_string(),
        stderr: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(Error::GitCommand {
            command: command.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

fn has_identity(dir: &Path) -> bool {
    ["user.name", "user.email"].iter().all(|key| {
        git(Some(dir), &GitAuth::None)
            .args(["config", *key])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

/// Unique remote URLs from `git remote -v` output, in order of appearance.
fn parse_remote_urls(remote_output: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    remote_output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_string)
        .collect()
}

fn is_up_to_date(pull_output: &str) -> bool {
    pull_output.contains("Already up to date") || pull_output.contains("Already up-to-date")
}
