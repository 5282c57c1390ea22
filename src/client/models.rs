//! Wire models for the `SyncIdentityProviders` child resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields the control plane owns and rejects in request bodies.
pub trait ServerManaged {
    /// Clear every server-managed field before the value is sent.
    fn strip_server_managed(&mut self);
}

/// Creation and modification metadata attached by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SystemData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// `User`, `Application`, `ManagedIdentity` or `Key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncIdentityProviderProperties {
    /// Base64-encoded identity provider manifests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,
}

/// An identity provider synchronised into an OpenShift cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncIdentityProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SyncIdentityProviderProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
}

impl SyncIdentityProvider {
    pub fn with_resources(resources: impl Into<String>) -> Self {
        Self {
            properties: Some(SyncIdentityProviderProperties {
                resources: Some(resources.into()),
            }),
            ..Self::default()
        }
    }
}

impl ServerManaged for SyncIdentityProvider {
    fn strip_server_managed(&mut self) {
        self.id = None;
        self.name = None;
        self.resource_type = None;
        self.system_data = None;
    }
}

/// Partial update body for PATCH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncIdentityProviderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SyncIdentityProviderProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<SystemData>,
}

impl ServerManaged for SyncIdentityProviderUpdate {
    fn strip_server_managed(&mut self) {
        self.system_data = None;
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// A page of `SyncIdentityProvider` values.
pub type SyncIdentityProviderList = ResourceListPage<SyncIdentityProvider>;
