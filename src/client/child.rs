//! Generic client for a child resource collection nested under a parent resource.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::instrument;

use super::ChildResourceApi;
use super::http::{ArmClient, ArmRequest};
use super::identifiers::{ParentIdentity, validate_resource_name};
use super::models::ServerManaged;
use super::pager::{self, Page};
use crate::core::ArmError;

/// Where a child resource type lives in the ARM namespace.
///
/// Item verbs and the list verb use separate path shapes because some services
/// publish them differently; both are listed here so the client never has to
/// guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildResourceType {
    /// Display name used in operation labels, e.g. `SyncIdentityProviders`.
    pub display_name: &'static str,
    pub provider: &'static str,
    /// Parent type segment for item verbs.
    pub parent_type: &'static str,
    /// Child segment for item verbs.
    pub item_segment: &'static str,
    /// Parent type segment for the list verb.
    pub list_parent_type: &'static str,
    /// Collection segment for the list verb.
    pub list_segment: &'static str,
    pub api_version: &'static str,
}

/// `Microsoft.RedHatOpenShift` sync identity providers, API version 2023-11-22.
pub const SYNC_IDENTITY_PROVIDERS: ChildResourceType = ChildResourceType {
    display_name: "SyncIdentityProviders",
    provider: "Microsoft.RedHatOpenShift",
    parent_type: "openshiftclusters",
    item_segment: "syncIdentityProvider",
    list_parent_type: "openShiftCluster",
    list_segment: "syncIdentityProviders",
    api_version: "2023-11-22",
};

/// Typed CRUD client for one child resource type.
///
/// `R` is the full resource model and `U` the partial update model.
#[derive(Debug, Clone)]
pub struct ChildResourceClient<R, U> {
    client: ArmClient,
    resource_type: ChildResourceType,
    _models: PhantomData<fn() -> (R, U)>,
}

impl<R, U> ChildResourceClient<R, U> {
    pub fn new(client: ArmClient, resource_type: ChildResourceType) -> Self {
        Self {
            client,
            resource_type,
            _models: PhantomData,
        }
    }

    pub fn resource_type(&self) -> &ChildResourceType {
        &self.resource_type
    }

    fn operation(&self, verb: &str) -> String {
        format!("{}.{verb}", self.resource_type.display_name)
    }

    fn item_url(
        &self,
        operation: &str,
        parent: &ParentIdentity,
        child_name: &str,
    ) -> Result<Url, ArmError> {
        parent.validate()?;
        validate_resource_name("childResourceName", child_name)?;
        let t = &self.resource_type;
        self.client.url(
            operation,
            &[
                "subscriptions",
                &parent.subscription_id,
                "resourceGroups",
                &parent.resource_group,
                "providers",
                t.provider,
                t.parent_type,
                &parent.resource_name,
                t.item_segment,
                child_name,
            ],
            t.api_version,
        )
    }

    fn list_url(&self, operation: &str, parent: &ParentIdentity) -> Result<Url, ArmError> {
        parent.validate()?;
        let t = &self.resource_type;
        self.client.url(
            operation,
            &[
                "subscriptions",
                &parent.subscription_id,
                "resourceGroups",
                &parent.resource_group,
                "providers",
                t.provider,
                t.list_parent_type,
                &parent.resource_name,
                t.list_segment,
            ],
            t.api_version,
        )
    }
}

impl<R, U> ChildResourceClient<R, U>
where
    R: DeserializeOwned + Send + 'static,
{
    /// Fetch the first page of the collection.
    ///
    /// An empty first page that still carries a continuation link is not final:
    /// links are followed until a page has items or no link remains.
    pub async fn list_first_page(&self, parent: &ParentIdentity) -> Result<Page<R>, ArmError> {
        let operation = self.operation("List");
        let url = self.list_url(&operation, parent)?;
        pager::first_page(&self.client, &operation, url).await
    }

    /// Fetch the page after `page`, or `None` when it was the last one.
    pub async fn next_page(&self, page: &Page<R>) -> Result<Option<Page<R>>, ArmError> {
        let Some(link) = page.next_link() else {
            return Ok(None);
        };
        let operation = self.operation("ListNextResults");
        pager::fetch_page(&self.client, &operation, link.clone()).await.map(Some)
    }
}

impl<R, U> ChildResourceApi for ChildResourceClient<R, U>
where
    R: Serialize + DeserializeOwned + ServerManaged + Clone + Send + Sync + 'static,
    U: Serialize + ServerManaged + Clone + Send + Sync + 'static,
{
    type Resource = R;
    type Update = U;

    #[instrument(skip(self, body), fields(operation = %self.operation("CreateOrUpdate")))]
    async fn create_or_update(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
        body: &R,
    ) -> Result<R, ArmError> {
        let operation = self.operation("CreateOrUpdate");
        let url = self.item_url(&operation, parent, child_name)?;
        let mut body = body.clone();
        body.strip_server_managed();
        let request = ArmRequest::new(operation, Method::PUT, url, &[200, 201]).with_json(&body)?;
        self.client.call(&request).await
    }

    #[instrument(skip(self), fields(operation = %self.operation("Get")))]
    async fn get(&self, parent: &ParentIdentity, child_name: &str) -> Result<R, ArmError> {
        let operation = self.operation("Get");
        let url = self.item_url(&operation, parent, child_name)?;
        self.client.call(&ArmRequest::new(operation, Method::GET, url, &[200])).await
    }

    #[instrument(skip(self), fields(operation = %self.operation("Delete")))]
    async fn delete(&self, parent: &ParentIdentity, child_name: &str) -> Result<(), ArmError> {
        let operation = self.operation("Delete");
        let url = self.item_url(&operation, parent, child_name)?;
        self.client.send(&ArmRequest::new(operation, Method::DELETE, url, &[200, 204])).await?;
        Ok(())
    }

    fn list<'a>(&'a self, parent: &'a ParentIdentity) -> BoxStream<'a, Result<R, ArmError>> {
        let operation = self.operation("List");
        let url = match self.list_url(&operation, parent) {
            Ok(url) => url,
            Err(error) => return stream::once(async move { Err(error) }).boxed(),
        };
        pager::page_stream::<R>(&self.client, operation, url)
            .map_ok(|page| stream::iter(page.into_items().into_iter().map(Ok::<R, ArmError>)))
            .try_flatten()
            .boxed()
    }

    #[instrument(skip(self, patch), fields(operation = %self.operation("Update")))]
    async fn update(
        &self,
        parent: &ParentIdentity,
        child_name: &str,
        patch: &U,
    ) -> Result<R, ArmError> {
        let operation = self.operation("Update");
        let url = self.item_url(&operation, parent, child_name)?;
        let mut patch = patch.clone();
        patch.strip_server_managed();
        let request = ArmRequest::new(operation, Method::PATCH, url, &[200]).with_json(&patch)?;
        self.client.call(&request).await
    }
}
