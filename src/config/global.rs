//! Global configuration management for armgen.
//!
//! This module handles the user configuration file (`~/.armgen/config.toml`)
//! holding the defaults every remote call needs: which subscription to
//! target, which ARM endpoint to talk to, and how hard to retry.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.armgen/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\armgen\config.toml`
//!
//! The location can be overridden with the `ARMGEN_CONFIG_PATH` environment
//! variable or the `--config` command line flag.
//!
//! # File Format
//!
//! ```toml
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! base_uri = "https://management.azure.com"
//! request_timeout_secs = 30
//! register_providers = true
//!
//! [retry]
//! max_retries = 4
//! initial_delay_ms = 100
//! max_delay_ms = 10000
//! ```
//!
//! # Credentials
//!
//! The bearer token is never read from or written to this file. It comes from
//! the `ARMGEN_ACCESS_TOKEN` environment variable only.
//!
//! # Precedence
//!
//! For the subscription id: command line flag, then `ARMGEN_SUBSCRIPTION_ID`,
//! then the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::client::{ClientOptions, RetryPolicy};
use crate::constants::{
    DEFAULT_BASE_URI, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, MAX_BACKOFF_DELAY_MS,
    STARTING_BACKOFF_DELAY_MS,
};
use crate::core::ArmError;

/// Overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "ARMGEN_CONFIG_PATH";
/// Overrides `subscription_id`.
pub const SUBSCRIPTION_ID_ENV: &str = "ARMGEN_SUBSCRIPTION_ID";
/// Supplies the bearer token for remote calls.
pub const ACCESS_TOKEN_ENV: &str = "ARMGEN_ACCESS_TOKEN";

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

const fn default_true() -> bool {
    true
}

const fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

const fn default_initial_delay_ms() -> u64 {
    STARTING_BACKOFF_DELAY_MS
}

const fn default_max_delay_ms() -> u64 {
    MAX_BACKOFF_DELAY_MS
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: STARTING_BACKOFF_DELAY_MS,
            max_delay_ms: MAX_BACKOFF_DELAY_MS,
        }
    }
}

/// User-wide settings for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default subscription for `sync-idp` commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    /// ARM endpoint. Sovereign clouds use a different host.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// Timeout applied to each HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Register missing resource providers automatically on first use.
    #[serde(default = "default_true")]
    pub register_providers: bool,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            subscription_id: None,
            base_uri: default_base_uri(),
            request_timeout_secs: default_request_timeout_secs(),
            register_providers: true,
            retry: RetryConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load from the default location, or return defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `path` when given, otherwise from the default location.
    ///
    /// A missing file yields the defaults in both cases.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(&path).await,
            Some(_) => Ok(Self::default()),
            None => Self::load().await,
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| ArmError::ConfigError {
            message: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories as needed.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        Ok(())
    }

    /// The configuration path: `ARMGEN_CONFIG_PATH` if set, else the platform default.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(crate::utils::expand_path(&path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("armgen")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".armgen")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Reject values that would produce an unusable client.
    pub fn validate(&self) -> Result<(), ArmError> {
        if reqwest::Url::parse(&self.base_uri).is_err() {
            return Err(ArmError::ConfigError {
                message: format!("base_uri '{}' is not an absolute URL", self.base_uri),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ArmError::ConfigError {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ArmError::ConfigError {
                message: "retry.initial_delay_ms must not exceed retry.max_delay_ms".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the subscription id from the flag, the environment, then the file.
    pub fn resolve_subscription_id(&self, explicit: Option<&str>) -> Result<String, ArmError> {
        self.resolve_subscription_id_from(explicit, std::env::var(SUBSCRIPTION_ID_ENV).ok())
    }

    fn resolve_subscription_id_from(
        &self,
        explicit: Option<&str>,
        from_env: Option<String>,
    ) -> Result<String, ArmError> {
        explicit
            .map(str::to_string)
            .or(from_env)
            .or_else(|| self.subscription_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ArmError::ConfigError {
                message: format!(
                    "no subscription id; pass --subscription, set {SUBSCRIPTION_ID_ENV}, or add subscription_id to the config file"
                ),
            })
    }

    /// Bearer token from `ARMGEN_ACCESS_TOKEN`, if set.
    pub fn access_token() -> Option<String> {
        std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty())
    }

    /// Client settings derived from this configuration.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_uri: self.base_uri.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry: RetryPolicy {
                max_retries: self.retry.max_retries,
                initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
                max_delay: Duration::from_millis(self.retry.max_delay_ms),
            },
            register_providers: self.register_providers,
            ..ClientOptions::default()
        }
    }
}
