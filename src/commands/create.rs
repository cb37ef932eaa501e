//! # Create Command Implementation
//!
//! This module implements the `create` subcommand, which adds new records to
//! the inventory:
//!
//! - `create app NAME --group GROUP [--template NAME]`: render an app from a
//!   template, creating the group if needed and registering the app in it
//! - `create stage NAME`: an empty stage and its shadow release
//! - `create release TYPE/NAME {--from-stage STAGE | --from-release TYPE/NAME}`:
//!   a release holding a copy of another version list

use anyhow::Result;
use clap::{Args, Subcommand};

use gosh::inventory::{App, AppGroup, Release, Stage};
use gosh::suggestions;

use super::{publish, Context, PushArgs};
use crate::cli::GlobalArgs;

/// Create an app, a stage or a release
#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(subcommand)]
    pub resource: CreateCommand,
}

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    /// Create an app from a template
    App(CreateAppArgs),
    /// Create a stage
    Stage(CreateStageArgs),
    /// Create a release from a stage or another release
    Release(CreateReleaseArgs),
}

#[derive(Args, Debug)]
pub struct CreateAppArgs {
    /// Name of the app, unique across all groups
    pub name: String,

    /// Group of the app, created when it does not exist
    #[arg(short, long, value_name = "GROUP")]
    pub group: String,

    /// App template in .gosh/templates (default: built-in template)
    #[arg(short, long, value_name = "NAME")]
    pub template: Option<String>,

    #[command(flatten)]
    pub push: PushArgs,
}

#[derive(Args, Debug)]
pub struct CreateStageArgs {
    /// Name of the stage
    pub name: String,

    #[command(flatten)]
    pub push: PushArgs,
}

#[derive(Args, Debug)]
pub struct CreateReleaseArgs {
    /// Release to create, as TYPE/NAME (type: product or hotfix)
    pub name: String,

    /// Copy the versions of this stage
    #[arg(short = 'S', long, value_name = "STAGE", conflicts_with = "from_release")]
    pub from_stage: Option<String>,

    /// Copy the versions of this release (TYPE/NAME)
    #[arg(short = 'R', long, value_name = "TYPE/NAME")]
    pub from_release: Option<String>,

    #[command(flatten)]
    pub push: PushArgs,
}

impl CreateCommand {
    fn push(&self) -> &PushArgs {
        match self {
            CreateCommand::App(args) => &args.push,
            CreateCommand::Stage(args) => &args.push,
            CreateCommand::Release(args) => &args.push,
        }
    }
}

/// Execute the `create` command.
pub fn execute(args: CreateArgs, global: &GlobalArgs) -> Result<()> {
    let context = Context::load(global)?;
    let push = args.resource.push().clone();
    let repository = context.sync(push.push)?;
    let inventory = context.inventory()?;

    match args.resource {
        CreateCommand::App(app_args) => {
            let group = AppGroup::new(&inventory, app_args.group.as_str());
            let mut app = App::new(&inventory, app_args.name.as_str(), group);
            app.create_from_template(app_args.template.as_deref())
                .map_err(suggestions::explain)?;
            println!("Created app {} in group {}", app.name(), app.group_name());
        }
        CreateCommand::Stage(stage_args) => {
            let stage = Stage::new(&inventory, stage_args.name.as_str());
            stage.create().map_err(suggestions::explain)?;
            println!("Created stage {}", stage.name());
        }
        CreateCommand::Release(release_args) => {
            let mut release = Release::from_full_name(&inventory, &release_args.name)
                .map_err(suggestions::explain)?;
            let created = match (release_args.from_stage, release_args.from_release) {
                (Some(stage), _) => release.create_from_stage(&stage),
                (None, Some(source)) => release.create_from_release(&source),
                (None, None) => return Err(suggestions::release_source_missing()),
            };
            created.map_err(suggestions::explain)?;
            println!("Created release {}", release.full_name());
        }
    }

    publish(repository, &push)
}
