//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which prepares the working
//! directory:
//!
//! - `init clone URL`: clone an existing deployment repository into an empty
//!   working directory and check that it has the inventory layout
//! - `init new [URL]`: optionally clone a (new, empty) repository, then create
//!   the inventory folder structure and template folder

use anyhow::Result;
use clap::{Args, Subcommand};

use gosh::auth::GitAuth;
use gosh::inventory::Inventory;
use gosh::repository::DeploymentRepository;
use gosh::suggestions;

use super::Context;
use crate::cli::GlobalArgs;

/// Set up the working directory as a deployment repository
#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(subcommand)]
    pub how: InitCommand,
}

#[derive(Subcommand, Debug)]
pub enum InitCommand {
    /// Clone an existing deployment repository into the working directory
    Clone {
        /// Git URL of the deployment repository
        url: String,
    },
    /// Create the inventory layout, cloning URL first when given
    New {
        /// Git URL of a new, empty deployment repository
        url: Option<String>,
    },
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, global: &GlobalArgs) -> Result<()> {
    let context = Context::load(global)?;
    match args.how {
        InitCommand::Clone { url } => {
            let repository = clone(&context, &url)?;
            repository.validate().map_err(suggestions::explain)?;
            println!(
                "Cloned deployment repository {} into {}",
                url,
                context.working_dir.display()
            );
        }
        InitCommand::New { url } => {
            if let Some(url) = url {
                clone(&context, &url)?;
            }
            Inventory::new(&context.working_dir)
                .scaffold()
                .map_err(suggestions::explain)?;
            println!(
                "Initialized deployment repository in {}",
                context.working_dir.display()
            );
        }
    }
    Ok(())
}

fn clone(context: &Context, url: &str) -> Result<DeploymentRepository> {
    let auth = GitAuth::from_config(&context.config).map_err(suggestions::explain)?;
    let mut repository = DeploymentRepository::new(url, auth, &context.working_dir);
    repository.clone_remote().map_err(suggestions::explain)?;
    Ok(repository)
}
