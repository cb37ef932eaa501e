//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// gosh (GitOps shell) - manage apps, stages and releases in a deployment repository
#[derive(Parser, Debug)]
#[command(name = "gosh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Enable debug logging (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working directory holding the deployment repository (default: current directory)
    #[arg(short = 'w', long, global = true, value_name = "DIR", env = "GOSH_WORKING_DIR")]
    pub workdir: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an app, a stage or a release
    Create(commands::create::CreateArgs),

    /// List the versions or artifacts of a stage or release
    List(commands::list::ListArgs),

    /// Update versions in a stage or release
    Update(commands::update::UpdateArgs),

    /// Set up the working directory as a deployment repository
    Init(commands::init::InitArgs),

    /// Import apps, stages and releases with an import plugin
    Import(commands::import::ImportArgs),

    /// Show the configuration options of gosh
    Config(commands::config::ConfigArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.global);

        let global = &self.global;
        match self.command {
            Commands::Create(args) => commands::create::execute(args, global),
            Commands::List(args) => commands::list::execute(args, global),
            Commands::Update(args) => commands::update::execute(args, global),
            Commands::Init(args) => commands::init::execute(args, global),
            Commands::Import(args) => commands::import::execute(args, global),
            Commands::Config(args) => commands::config::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Initialize `env_logger` from the global flags. `RUST_LOG`, when set,
/// takes precedence.
fn init_logging(global: &GlobalArgs) {
    let level = if global.verbose {
        LevelFilter::Debug
    } else {
        global.log_level.parse().unwrap_or(LevelFilter::Warn)
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // A second initialization (tests) is harmless.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gosh",
            "list",
            "versions",
            "--stage",
            "alpha",
            "--workdir",
            "/deploy",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.global.workdir.as_deref(), Some("/deploy"));
        assert_eq!(cli.global.log_level, "debug");
    }

    #[test]
    fn test_log_level_defaults_to_warn() {
        let cli = Cli::try_parse_from(["gosh", "config"]).unwrap();
        assert_eq!(cli.global.log_level, "warn");
        assert!(!cli.global.verbose);
    }
}
