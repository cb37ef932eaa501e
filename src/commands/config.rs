//! # Config Command Implementation
//!
//! This module implements the `config` subcommand, which explains where gosh
//! reads its configuration from and which options exist.

use anyhow::Result;
use clap::Args;

/// Show the configuration options of gosh
#[derive(Args, Debug)]
pub struct ConfigArgs {}

const CONFIG_HELP: &str = r#"Configuration options:

gosh reads configuration from 3 places, later ones override earlier ones:
- '~/.gosh/config.yml' in your home dir
- './.gosh/config.yml' in your working dir (project specific)
- GOSH_* environment variables

Keys are case-insensitive.

1) Deployment repository

repository:
  url: https://git.example/deploy.git

GOSH_REPOSITORY_URL=https://git.example/deploy.git

When a URL is set, commands that change the inventory first check that the
working directory is a clone of it and pull, and '--push' commits and pushes
the result.

2) Authentication for git repositories

2.1) Basic auth (use HTTPS repository URLs)

auth:
  type: basic
  user: your-user
  pass: your-pass-base64-encoded

GOSH_AUTH_TYPE=basic
GOSH_AUTH_USER=your-user
GOSH_AUTH_PASS=your-pass-base64-encoded

2.2) SSH key

auth:
  type: ssh
  private_key_file: ~/.ssh/id_rsa
  private_key_pass: your-private-key-pass-base64-encoded

GOSH_AUTH_TYPE=ssh
GOSH_AUTH_PRIVATE_KEY_FILE=~/.ssh/id_rsa
GOSH_AUTH_PRIVATE_KEY_PASS=your-private-key-pass-base64-encoded

Without an auth section, your own git and ssh setup is used.

3) Output of 'gosh list'

output:
  default_format: yaml          # yaml|properties|json, '--output' wins
  versions_key_suffix: version  # APP.version=VERSION for 'list versions'
  artifacts_key_suffix: ""      # APP=URL for 'list artifacts'

GOSH_OUTPUT_DEFAULT_FORMAT=properties
GOSH_OUTPUT_VERSIONS_KEY_SUFFIX=version
GOSH_OUTPUT_ARTIFACTS_KEY_SUFFIX=

4) Artifact repositories

Used to replace [gosh:repo:TYPE] in app artifacts. The entry named after the
listed stage or release is used, else 'default'.

artifact_repositories:
  maven:
    default: https://your.maven.repo/repository/released
    alpha: https://your.maven.repo/repository/tested
  docker:
    default: your.docker.registry

5) Other settings

GOSH_WORKING_DIR  working directory (same as --workdir)
GOSH_PLUGIN_DIR   directory of import plugins (default: ~/.gosh/plugins)
RUST_LOG          log filter, overrides --log-level
"#;

/// Execute the `config` command.
pub fn execute(_args: ConfigArgs) -> Result<()> {
    print!("{}", CONFIG_HELP);
    Ok(())
}
