//! `armgen sync-idp`: manage sync identity providers of an OpenShift cluster.
//!
//! Credentials come from `ARMGEN_ACCESS_TOKEN`; the subscription from
//! `--subscription`, `ARMGEN_SUBSCRIPTION_ID`, or the global config, in that
//! order.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use futures::TryStreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::client::{
    ArmClient, ChildResourceApi, ParentIdentity, SyncIdentityProvider,
    SyncIdentityProviderProperties, SyncIdentityProviderUpdate, SyncIdentityProvidersClient,
};
use crate::config::{ACCESS_TOKEN_ENV, GlobalConfig};
use crate::utils::expand_path;

/// Manage sync identity providers.
#[derive(Args)]
pub struct SyncIdpCommand {
    #[command(subcommand)]
    action: SyncIdpAction,
}

/// Which cluster the command targets.
#[derive(Args, Clone, Debug)]
struct ClusterArgs {
    /// Subscription id (defaults to ARMGEN_SUBSCRIPTION_ID or the config file)
    #[arg(long, value_name = "ID")]
    subscription: Option<String>,

    /// Resource group containing the cluster
    #[arg(short = 'g', long, value_name = "NAME")]
    resource_group: String,

    /// OpenShift cluster name
    #[arg(short, long, value_name = "NAME")]
    cluster: String,
}

/// Request body source for `put` and `patch`.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
struct BodyArgs {
    /// Base64-encoded identity provider manifests
    #[arg(long, value_name = "BASE64")]
    resources: Option<String>,

    /// JSON file holding the full request body
    #[arg(long, value_name = "PATH")]
    file: Option<String>,
}

impl BodyArgs {
    fn load<T: DeserializeOwned>(&self, from_resources: impl FnOnce(String) -> T) -> Result<T> {
        if let Some(resources) = &self.resources {
            return Ok(from_resources(resources.clone()));
        }
        let path = self.file.as_deref().map(expand_path).unwrap_or_default();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request body from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON request body in {}", path.display()))
    }
}

#[derive(Subcommand)]
enum SyncIdpAction {
    /// Show one sync identity provider
    Get {
        #[command(flatten)]
        target: ClusterArgs,
        /// Sync identity provider name
        name: String,
    },

    /// List every sync identity provider of the cluster
    List {
        #[command(flatten)]
        target: ClusterArgs,
    },

    /// Create or replace a sync identity provider
    Put {
        #[command(flatten)]
        target: ClusterArgs,
        /// Sync identity provider name
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Update the properties of a sync identity provider
    Patch {
        #[command(flatten)]
        target: ClusterArgs,
        /// Sync identity provider name
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Delete a sync identity provider
    Delete {
        #[command(flatten)]
        target: ClusterArgs,
        /// Sync identity provider name
        name: String,
    },
}

impl SyncIdpAction {
    fn target(&self) -> &ClusterArgs {
        match self {
            Self::Get {
                target,
                ..
            }
            | Self::List {
                target,
            }
            | Self::Put {
                target,
                ..
            }
            | Self::Patch {
                target,
                ..
            }
            | Self::Delete {
                target,
                ..
            } => target,
        }
    }
}

impl SyncIdpCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = GlobalConfig::load_with_optional(config_path).await?;
        let target = self.action.target().clone();
        let subscription_id = config.resolve_subscription_id(target.subscription.as_deref())?;

        let mut arm = ArmClient::new(subscription_id.clone(), config.client_options())?;
        match GlobalConfig::access_token() {
            Some(token) => arm = arm.with_access_token(token),
            None => warn!("{ACCESS_TOKEN_ENV} is not set; sending unauthenticated requests"),
        }
        debug!(base_uri = %config.base_uri, "Created ARM client");

        let client = SyncIdentityProvidersClient::for_sync_identity_providers(arm);
        let parent = ParentIdentity::new(subscription_id, target.resource_group, target.cluster);
        run(&client, &parent, self.action).await
    }
}

async fn run<C>(client: &C, parent: &ParentIdentity, action: SyncIdpAction) -> Result<()>
where
    C: ChildResourceApi<Resource = SyncIdentityProvider, Update = SyncIdentityProviderUpdate>,
{
    match action {
        SyncIdpAction::Get {
            name,
            ..
        } => print_json(&client.get(parent, &name).await?),
        SyncIdpAction::List {
            ..
        } => {
            let providers: Vec<SyncIdentityProvider> = client.list(parent).try_collect().await?;
            print_json(&providers)
        }
        SyncIdpAction::Put {
            name,
            body,
            ..
        } => {
            let body = body.load(SyncIdentityProvider::with_resources)?;
            print_json(&client.create_or_update(parent, &name, &body).await?)
        }
        SyncIdpAction::Patch {
            name,
            body,
            ..
        } => {
            let patch = body.load(|resources| SyncIdentityProviderUpdate {
                properties: Some(SyncIdentityProviderProperties {
                    resources: Some(resources),
                }),
                system_data: None,
            })?;
            print_json(&client.update(parent, &name, &patch).await?)
        }
        SyncIdpAction::Delete {
            name,
            ..
        } => {
            client.delete(parent, &name).await?;
            println!("{} Deleted sync identity provider {}", "✓".green(), name.bold());
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
