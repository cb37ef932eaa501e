//! # List Command Implementation
//!
//! This module implements the `list` subcommand, which prints the versions or
//! the artifact URLs of a stage or release.
//!
//! ## Functionality
//!
//! - **Selection**: exactly one of `--stage` or `--release` names the list
//! - **Filtering**: by app group (`--group`) or app name (positional); the
//!   app name wins when both are given
//! - **Formats**: yaml, properties or json, with key suffixes from the
//!   `output` configuration
//!
//! This command is read-only and does not contact the remote.

use anyhow::Result;
use clap::{Args, Subcommand};
use log::trace;

use gosh::defaults;
use gosh::listing::{self, OutputFormat};
use gosh::suggestions;
use gosh::versions::{get_artifacts, get_versions, ArtifactPolicy, ListSelector};

use super::Context;
use crate::cli::GlobalArgs;

/// List the versions or artifacts of a stage or release
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(subcommand)]
    pub what: ListCommand,
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List app versions
    Versions(ListVersionsArgs),
    /// List artifact URLs of the app versions
    Artifacts(ListArtifactsArgs),
}

/// Options shared by both listings.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Only this app
    pub app: Option<String>,

    /// Stage to list
    #[arg(short, long, value_name = "STAGE")]
    pub stage: Option<String>,

    /// Release to list, as TYPE/NAME
    #[arg(short, long, value_name = "TYPE/NAME")]
    pub release: Option<String>,

    /// Only apps of this group
    #[arg(short, long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Output format: yaml, properties or json (default: output.default_format, else yaml)
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListVersionsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Args, Debug)]
pub struct ListArtifactsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Artifact type to resolve
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "maven")]
    pub artifact_type: String,

    /// Leave out apps without the artifact type instead of failing
    #[arg(long)]
    pub skip_missing: bool,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    trace!("running command list with args: {:?}", args);
    let context = Context::load(global)?;
    let inventory = context.inventory()?;

    let (selection, entries, suffix) = match args.what {
        ListCommand::Versions(versions_args) => {
            let selection = versions_args.selection;
            let list = selector(&selection)?
                .load(&inventory)
                .map_err(suggestions::explain)?;
            let entries = get_versions(
                list.as_ref(),
                selection.group.as_deref(),
                selection.app.as_deref(),
            );
            let suffix = context.config.output.versions_key_suffix.clone();
            (selection, entries, suffix)
        }
        ListCommand::Artifacts(artifacts_args) => {
            let selection = artifacts_args.selection;
            let list = selector(&selection)?
                .load(&inventory)
                .map_err(suggestions::explain)?;
            let policy = if artifacts_args.skip_missing {
                ArtifactPolicy::Skip
            } else {
                ArtifactPolicy::Abort
            };
            let entries = get_artifacts(
                list.as_ref(),
                selection.group.as_deref(),
                selection.app.as_deref(),
                &artifacts_args.artifact_type,
                &context.config.artifact_repositories,
                policy,
            )
            .map_err(suggestions::explain)?;
            let suffix = context.config.output.artifacts_key_suffix.clone();
            (selection, entries, suffix)
        }
    };

    let format: OutputFormat = selection
        .output
        .as_deref()
        .or(context.config.output.default_format.as_deref())
        .unwrap_or(defaults::OUTPUT_FORMAT)
        .parse()?;
    let rendered = listing::render(format, &entries, &suffix)?;
    if !rendered.is_empty() {
        println!("{}", rendered.trim_end());
    }
    Ok(())
}

fn selector(selection: &SelectionArgs) -> Result<ListSelector> {
    Ok(ListSelector::from_flags(
        selection.stage.as_deref(),
        selection.release.as_deref(),
    )?)
}
