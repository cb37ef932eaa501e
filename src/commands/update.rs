//! # Update Command Implementation
//!
//! This module implements the `update` subcommand. `update version` sets the
//! version of one app in a stage (and its shadow release) or in a release,
//! optionally committing and pushing the change.

use anyhow::Result;
use clap::{Args, Subcommand};
use log::info;

use gosh::suggestions;
use gosh::versions::ListSelector;

use super::{publish, Context, PushArgs};
use crate::cli::GlobalArgs;

/// Update versions in a stage or release
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub what: UpdateCommand,
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    /// Set the version of an app
    Version(UpdateVersionArgs),
}

#[derive(Args, Debug)]
pub struct UpdateVersionArgs {
    /// App to update
    pub app: String,

    /// New version
    pub version: String,

    /// Stage to update
    #[arg(short, long, value_name = "STAGE")]
    pub stage: Option<String>,

    /// Release to update, as TYPE/NAME
    #[arg(short, long, value_name = "TYPE/NAME")]
    pub release: Option<String>,

    #[command(flatten)]
    pub push: PushArgs,
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, global: &GlobalArgs) -> Result<()> {
    match args.what {
        UpdateCommand::Version(version_args) => update_version(version_args, global),
    }
}

fn update_version(args: UpdateVersionArgs, global: &GlobalArgs) -> Result<()> {
    let selector = ListSelector::from_flags(args.stage.as_deref(), args.release.as_deref())?;
    let context = Context::load(global)?;
    let repository = context.sync(args.push.push)?;
    let inventory = context.inventory()?;

    let mut list = selector.load(&inventory).map_err(suggestions::explain)?;
    list.update_version(&args.app, &args.version)
        .map_err(suggestions::explain)?;
    info!(
        "Updated app {} to version {} for {} {}",
        args.app,
        args.version,
        list.kind(),
        list.name()
    );
    println!(
        "Updated {} to {} in {} {}",
        args.app,
        args.version,
        list.kind(),
        list.name()
    );

    publish(repository, &args.push)
}
