//! # gosh CLI
//!
//! This is the binary entry point for the `gosh` command-line tool.
//!
//! Its primary responsibilities are:
//! - Answering `SSH_ASKPASS` prompts when git runs gosh as its askpass helper.
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//!
//! The core application logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // ssh runs `$SSH_ASKPASS <prompt>`; answer with the key passphrase.
    if let Some(secret) = gosh::auth::askpass_response() {
        println!("{}", secret);
        return Ok(());
    }

    let cli = cli::Cli::parse();
    cli.execute()
}
