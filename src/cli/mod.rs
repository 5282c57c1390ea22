//! Command-line interface for armgen.
//!
//! # Commands
//!
//! - `generate` - Build an ARM template from `armgen.toml`
//! - `validate` - Check an existing template's integrity and print its deployment order
//! - `kinds` - List supported resource kinds and their API versions
//! - `sync-idp` - Manage sync identity providers of an OpenShift cluster
//! - `config` - Inspect or create the global configuration
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging (overridden by `RUST_LOG`)
//! - `--quiet` / `-q` - No logging at all
//! - `--config <PATH>` - Global configuration file to use instead of the default
//!
//! # Example
//!
//! ```bash
//! armgen generate --manifest infra/armgen.toml --output out/azuredeploy.json
//! armgen validate out/azuredeploy.json --order
//! armgen sync-idp list -g my-rg -c my-cluster
//! ```

mod config;
mod generate;
mod kinds;
mod sync_idp;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::utils::expand_path;

pub use validate::OutputFormat;

/// Main CLI structure for armgen.
#[derive(Parser)]
#[command(
    name = "armgen",
    about = "Generate ARM deployment templates and manage Azure child resources",
    version,
    long_about = "armgen builds validated Azure Resource Manager templates from a small TOML manifest \
                  and provides a typed client for OpenShift sync identity providers."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a deployment template from a manifest
    Generate(generate::GenerateCommand),

    /// Validate an existing deployment template
    Validate(validate::ValidateCommand),

    /// List supported resource kinds
    Kinds(kinds::KindsCommand),

    /// Manage sync identity providers of an OpenShift cluster
    #[command(name = "sync-idp")]
    SyncIdp(sync_idp::SyncIdpCommand),

    /// Inspect or create the global configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config_path: Option<PathBuf> = self.config.as_deref().map(expand_path);

        match self.command {
            Commands::Generate(cmd) => cmd.execute(),
            Commands::Validate(cmd) => cmd.execute(),
            Commands::Kinds(cmd) => cmd.execute(),
            Commands::SyncIdp(cmd) => cmd.execute(config_path).await,
            Commands::Config(cmd) => cmd.execute(config_path).await,
        }
    }

    /// Log filter implied by the flags when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "off"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over `--verbose` and `--quiet`.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_log_level()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
