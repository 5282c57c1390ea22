//! Configuration management for armgen
//!
//! Two files drive the tool:
//!
//! 1. **Global Configuration** (`~/.armgen/config.toml`) - subscription, endpoint
//!    and retry defaults for remote calls, handled here
//! 2. **Manifest** (`armgen.toml`) - the resources to generate, handled by
//!    [`crate::manifest`]
//!
//! Credentials never live in either file; see [`GlobalConfig::access_token`].

mod global;

pub use global::{
    ACCESS_TOKEN_ENV, CONFIG_PATH_ENV, GlobalConfig, RetryConfig, SUBSCRIPTION_ID_ENV,
};
