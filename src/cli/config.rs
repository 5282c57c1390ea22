//! Manage the global armgen configuration.
//!
//! The global file (`~/.armgen/config.toml`) holds defaults for remote calls:
//! subscription, ARM endpoint, timeouts, and retry behaviour. The access token
//! is never stored there.
//!
//! # Examples
//!
//! ```bash
//! armgen config init
//! armgen config show
//! armgen config       # defaults to show
//! armgen config path
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{ACCESS_TOKEN_ENV, GlobalConfig, SUBSCRIPTION_ID_ENV};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Path) => Self::show_path(config_path),
        }
    }

    fn resolve_path(config_path: Option<PathBuf>) -> Result<PathBuf> {
        match config_path {
            Some(path) => Ok(path),
            None => GlobalConfig::default_path(),
        }
    }

    async fn init(force: bool, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = Self::resolve_path(config_path)?;

        if config_path.exists() && !force {
            println!("❌ Global config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = GlobalConfig::default();
        config.save_to(&config_path).await?;

        println!("✅ Created global config at: {}", config_path.display());
        println!("\n{}", "Next steps:".yellow());
        println!("  1. Set subscription_id, or export {SUBSCRIPTION_ID_ENV}");
        println!("  2. Export {ACCESS_TOKEN_ENV} with a bearer token for the subscription");

        Ok(())
    }

    async fn show(config_path: Option<PathBuf>) -> Result<()> {
        let path = Self::resolve_path(config_path)?;
        let config = GlobalConfig::load_with_optional(Some(path.clone())).await?;

        let source = if path.exists() {
            path.display().to_string()
        } else {
            format!("{} (not found, showing defaults)", path.display())
        };
        println!("{} {}", "Global configuration:".bold(), source);
        println!();
        println!("{}", toml::to_string_pretty(&config)?);

        let token = if GlobalConfig::access_token().is_some() {
            "set".green()
        } else {
            "not set".yellow()
        };
        println!("{ACCESS_TOKEN_ENV}: {token}");
        if let Ok(subscription) = std::env::var(SUBSCRIPTION_ID_ENV) {
            println!("{SUBSCRIPTION_ID_ENV}: {subscription}");
        }

        Ok(())
    }

    fn show_path(config_path: Option<PathBuf>) -> Result<()> {
        let path = Self::resolve_path(config_path)?;
        println!("{}", path.display());
        Ok(())
    }
}
