//! Typed client for ARM child resources.
//!
//! The [`ChildResourceApi`] trait is the contract the rest of the crate (and
//! the CLI) programs against. [`ChildResourceClient`] implements it once for
//! any child resource type described by a [`ChildResourceType`];
//! [`SyncIdentityProvidersClient`] is that client specialised to
//! `Microsoft.RedHatOpenShift` sync identity providers.
//!
//! All verbs validate identifiers before a request is prepared, so a malformed
//! name fails with [`ArmError::Validation`] without touching the network.
//!
//! ```rust,no_run
//! use armgen_cli::client::{
//!     ArmClient, ChildResourceApi, ClientOptions, ParentIdentity, SyncIdentityProvidersClient,
//! };
//! use futures::TryStreamExt;
//!
//! # async fn example() -> Result<(), armgen_cli::core::ArmError> {
//! let arm = ArmClient::new("00000000-0000-0000-0000-000000000000", ClientOptions::default())?
//!     .with_access_token("token");
//! let parent = ParentIdentity::new(arm.subscription_id(), "my-rg", "my-cluster");
//! let client = SyncIdentityProvidersClient::for_sync_identity_providers(arm);
//! let all: Vec<_> = client.list(&parent).try_collect().await?;
//! println!("{} identity providers", all.len());
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod http;
pub mod identifiers;
pub mod models;
pub mod pager;

use futures::stream::BoxStream;
use std::future::Future;

pub use child::{ChildResourceClient, ChildResourceType, SYNC_IDENTITY_PROVIDERS};
pub use http::{ArmClient, ClientOptions, RetryPolicy};
pub use identifiers::ParentIdentity;
pub use models::{
    ServerManaged, SyncIdentityProvider, SyncIdentityProviderList, SyncIdentityProviderProperties,
    SyncIdentityProviderUpdate, SystemData,
};
pub use pager::Page;

use crate::core::ArmError;

/// CRUD verbs on a child resource nested under a parent resource.
pub trait ChildResourceApi {
    type Resource;
    type Update;

    /// PUT the resource; idempotent. Server-managed fields are not sent.
    fn create_or_update(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
        body: &Self::Resource,
    ) -> impl Future<Output = Result<Self::Resource, ArmError>> + Send;

    fn get(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
    ) -> impl Future<Output = Result<Self::Resource, ArmError>> + Send;

    fn delete(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
    ) -> impl Future<Output = Result<(), ArmError>> + Send;

    /// Every resource in the collection, following continuation links lazily.
    fn list<'a>(
        &'a self,
        parent: &'a ParentIdentity,
    ) -> BoxStream<'a, Result<Self::Resource, ArmError>>;

    /// PATCH with `systemData` stripped from the outgoing body.
    fn update(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
        patch: &Self::Update,
    ) -> impl Future<Output = Result<Self::Resource, ArmError>> + Send;
}

/// Client for `Microsoft.RedHatOpenShift/openShiftClusters/syncIdentityProviders`.
pub type SyncIdentityProvidersClient =
    ChildResourceClient<SyncIdentityProvider, SyncIdentityProviderUpdate>;

impl SyncIdentityProvidersClient {
    pub fn for_sync_identity_providers(client: ArmClient) -> Self {
        Self::new(client, SYNC_IDENTITY_PROVIDERS)
    }
}
