//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `gosh`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! Commands share a [`Context`]: the resolved working directory and the
//! loaded configuration. Commands that write to the inventory call
//! [`Context::sync`] first, which pulls the deployment repository when a
//! repository URL is configured, and [`publish`] afterwards.

pub mod completions;
pub mod config;
pub mod create;
pub mod import;
pub mod init;
pub mod list;
pub mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::debug;

use gosh::auth::GitAuth;
use gosh::config::{resolve_working_dir, Config};
use gosh::error::Error;
use gosh::inventory::Inventory;
use gosh::repository::{is_dir_empty, DeploymentRepository};
use gosh::suggestions;

use crate::cli::GlobalArgs;

/// Options for commands that can push their changes.
#[derive(Args, Debug, Clone, Default)]
pub struct PushArgs {
    /// Commit and push the changes to the deployment repository
    #[arg(short, long)]
    pub push: bool,

    /// Commit message, used with --push
    #[arg(short, long, value_name = "MESSAGE", requires = "push")]
    pub message: Option<String>,
}

/// Working directory and configuration of one invocation.
#[derive(Debug)]
pub struct Context {
    pub working_dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let working_dir = resolve_working_dir(global.workdir.as_deref())?;
        debug!("Using working directory {}", working_dir.display());
        let config = Config::load(&working_dir).map_err(suggestions::explain)?;
        Ok(Self {
            working_dir,
            config,
        })
    }

    /// The inventory, which must already be laid out in the working directory.
    pub fn inventory(&self) -> Result<Inventory> {
        let inventory = Inventory::new(&self.working_dir);
        if inventory.has_layout() {
            return Ok(inventory);
        }
        let error = if is_dir_empty(&self.working_dir)? {
            Error::WorkingDirEmpty {
                path: self.working_dir.clone(),
            }
        } else {
            Error::InvalidDeploymentRepository {
                path: self.working_dir.clone(),
                message: "missing inventory/classes folder".to_string(),
            }
        };
        Err(suggestions::explain(error))
    }

    /// A handle on the configured remote, if any.
    pub fn repository(&self) -> Result<Option<DeploymentRepository>> {
        let Some(url) = self.config.repository.url.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let auth = GitAuth::from_config(&self.config).map_err(suggestions::explain)?;
        Ok(Some(DeploymentRepository::new(url, auth, &self.working_dir)))
    }

    /// Bring the working directory up to date before a write.
    ///
    /// Without a configured repository URL the inventory is used as is,
    /// unless the command is going to push.
    pub fn sync(&self, push: bool) -> Result<Option<DeploymentRepository>> {
        let Some(mut repository) = self.repository()? else {
            if push {
                return Err(suggestions::repository_url_missing());
            }
            debug!("No deployment repository URL configured, using the working directory as is");
            return Ok(None);
        };
        repository.open().map_err(suggestions::explain)?;
        repository.pull().map_err(suggestions::explain)?;
        Ok(Some(repository))
    }
}

/// Commit and push the changes of a command when `--push` was given.
pub fn publish(repository: Option<DeploymentRepository>, push: &PushArgs) -> Result<()> {
    if !push.push {
        return Ok(());
    }
    let Some(mut repository) = repository else {
        return Err(suggestions::repository_url_missing());
    };
    if repository
        .commit_and_push(push.message.as_deref())
        .map_err(suggestions::explain)?
    {
        println!("Pushed changes to {}", repository.url());
    } else {
        println!("Nothing to push");
    }
    Ok(())
}
