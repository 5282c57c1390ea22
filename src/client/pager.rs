//! Continuation-link pagination.
//!
//! List endpoints return `{ "value": [...], "nextLink": "..." }`. [`page_stream`]
//! follows `nextLink` until it is absent and yields each page; callers that
//! want items flatten the pages with `TryStreamExt::try_flatten`.

use futures::stream::{self, Stream};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::http::{ArmClient, ArmRequest};
use super::models::ResourceListPage;
use crate::core::ArmError;

/// One page of results plus the link to the next page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    next_link: Option<Url>,
}

impl<T> Page<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn next_link(&self) -> Option<&Url> {
        self.next_link.as_ref()
    }

    pub fn has_next_link(&self) -> bool {
        self.next_link.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fetch and decode a single page.
pub(crate) async fn fetch_page<T: DeserializeOwned>(
    client: &ArmClient,
    operation: &str,
    url: Url,
) -> Result<Page<T>, ArmError> {
    let request = ArmRequest::new(operation, Method::GET, url, &[200]);
    let raw: ResourceListPage<T> = client.call(&request).await?;
    let next_link = match raw.next_link.as_deref() {
        Some(link) if !link.is_empty() => Some(client.resolve_link(operation, link)?),
        _ => None,
    };
    debug!(
        target: "client::pager",
        operation,
        items = raw.value.len(),
        has_next = next_link.is_some(),
        "Fetched page"
    );
    Ok(Page {
        items: raw.value,
        next_link,
    })
}

/// Fetch the first page; an empty page that still carries a `nextLink` is not
/// treated as the end, so links are followed until items appear or the links run out.
pub(crate) async fn first_page<T: DeserializeOwned>(
    client: &ArmClient,
    operation: &str,
    url: Url,
) -> Result<Page<T>, ArmError> {
    let mut page = fetch_page(client, operation, url).await?;
    while page.is_empty()
        && let Some(next) = page.next_link.take()
    {
        page = fetch_page(client, operation, next).await?;
    }
    Ok(page)
}

/// Lazily fetch every page starting at `first`.
///
/// A page whose `nextLink` points back at itself ends the stream instead of
/// looping forever.
pub(crate) fn page_stream<'a, T>(
    client: &'a ArmClient,
    operation: String,
    first: Url,
) -> impl Stream<Item = Result<Page<T>, ArmError>> + Send + 'a
where
    T: DeserializeOwned + Send + 'a,
{
    stream::try_unfold(Some(first), move |next| {
        let operation = operation.clone();
        async move {
            let Some(url) = next else {
                return Ok(None);
            };
            let mut page = fetch_page::<T>(client, &operation, url.clone()).await?;
            if page.next_link.as_ref() == Some(&url) {
                warn!(target: "client::pager", operation = %operation, "Continuation link repeats the current page; stopping");
                page.next_link = None;
            }
            let following = page.next_link.clone();
            Ok(Some((page, following)))
        }
    })
}
