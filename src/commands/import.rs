//! # Import Command Implementation
//!
//! This module implements the `import` subcommand:
//!
//! - `import PLUGIN [all|apps|stages|releases]...` runs an import plugin and
//!   applies its data to the inventory (default: all)
//! - `import plugins` lists the built-in and installed plugins
//!
//! ## Example
//!
//! ```bash
//! # Import everything listed in .gosh/import.yml
//! gosh import manifest
//!
//! # Only stage versions, from another manifest file
//! gosh import manifest stages --source versions.yml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gosh::defaults;
use gosh::importer::{self, ImportOptions, ImportSelection, BUILTIN_PLUGINS};
use gosh::suggestions;

use super::{publish, Context, PushArgs};
use crate::cli::GlobalArgs;

/// Name that lists plugins instead of running one.
const LIST_PLUGINS: &str = "plugins";

/// Import apps, stages and releases with an import plugin
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Plugin to run, or 'plugins' to list the available plugins
    pub plugin: String,

    /// What to import: all, apps, stages, releases (default: all)
    pub parts: Vec<String>,

    /// Manifest file read by the 'manifest' plugin (default: .gosh/import.yml)
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// App template for imported apps that do not name one
    #[arg(short, long, value_name = "NAME")]
    pub template: Option<String>,

    /// Directory holding external import plugins (default: ~/.gosh/plugins)
    #[arg(long, value_name = "DIR", env = "GOSH_PLUGIN_DIR")]
    pub plugin_dir: Option<PathBuf>,

    #[command(flatten)]
    pub push: PushArgs,
}

/// Execute the `import` command.
pub fn execute(args: ImportArgs, global: &GlobalArgs) -> Result<()> {
    let plugin_dir = args.plugin_dir.clone().unwrap_or_else(defaults::plugin_dir);
    if args.plugin == LIST_PLUGINS {
        return list_plugins(&plugin_dir);
    }

    let selection =
        ImportSelection::from_args(args.parts.as_slice()).map_err(suggestions::explain)?;
    let importer = importer::resolve(&args.plugin, &plugin_dir).map_err(suggestions::explain)?;
    let context = Context::load(global)?;
    let repository = context.sync(args.push.push)?;
    let inventory = context.inventory()?;

    let options = ImportOptions {
        selection,
        template: args.template.clone(),
        source: args.source.clone(),
    };
    let summary =
        importer::run(importer.as_ref(), &inventory, &options).map_err(suggestions::explain)?;
    println!(
        "Imported with plugin {}: {} apps created ({} skipped), {} stages and {} releases created, {} versions updated ({} skipped)",
        importer.name(),
        summary.apps_created,
        summary.apps_skipped,
        summary.stages_created,
        summary.releases_created,
        summary.versions_updated,
        summary.versions_skipped
    );

    publish(repository, &args.push)
}

fn list_plugins(plugin_dir: &std::path::Path) -> Result<()> {
    println!("Bundled import plugins:");
    for name in BUILTIN_PLUGINS {
        println!("- {}", name);
    }
    println!();
    println!("Available import plugins:");
    let installed = importer::list_plugins(plugin_dir)?;
    if installed.is_empty() {
        println!("- NO PLUGINS INSTALLED");
    }
    for name in installed {
        println!("- {}", name);
    }
    println!(
        "\nTo install a plugin, copy the executable to {}",
        plugin_dir.display()
    );
    Ok(())
}
