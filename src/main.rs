//! armgen CLI entry point
//!
//! Parses arguments, installs logging, runs the command, and turns any error
//! into a colored message with a suggestion before exiting with status 1.

use anyhow::Result;
use armgen_cli::cli;
use armgen_cli::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.init_logging();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
