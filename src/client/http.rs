//! Shared HTTP plumbing for ARM management-plane calls.
//!
//! Every client verb reduces to one [`ArmClient::call`]: build the request,
//! send it with retries, check the status against the verb's accepted codes,
//! and decode the body. Transient failures (network errors, 429, 5xx) are
//! retried with exponential backoff. A 409 `MissingSubscriptionRegistration`
//! triggers one registration of the provider namespace named in the request
//! path, after which the request is sent again.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::{
    CLIENT_REQUEST_ID_HEADER, DEFAULT_BASE_URI, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT,
    JSON_CONTENT_TYPE, MAX_BACKOFF_DELAY_MS, MISSING_REGISTRATION_CODE,
    PROVIDER_REGISTRATION_API_VERSION, REGISTRATION_POLL_ATTEMPTS, REGISTRATION_POLL_INTERVAL,
    STARTING_BACKOFF_DELAY_MS,
};
use crate::core::{ArmError, ServerErrorKind};

/// Backoff settings for transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(STARTING_BACKOFF_DELAY_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delays of `initial, 2×initial, 4×initial, ...` capped at `max_delay`, with jitter.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff yields factor × base^n, so base 2 doubles each step
        let factor = (self.initial_delay.as_millis() / 2).max(1) as u64;
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_retries)
    }
}

/// Settings shared by every client built on [`ArmClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_uri: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Register missing provider namespaces on 409 `MissingSubscriptionRegistration`.
    pub register_providers: bool,
    pub registration_poll_interval: Duration,
    pub registration_poll_attempts: usize,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            register_providers: true,
            registration_poll_interval: REGISTRATION_POLL_INTERVAL,
            registration_poll_attempts: REGISTRATION_POLL_ATTEMPTS,
            user_agent: format!("armgen/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A prepared request: verb, absolute URL, optional JSON body and accepted statuses.
#[derive(Debug, Clone)]
pub(crate) struct ArmRequest {
    pub operation: String,
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub accepted: &'static [u16],
}

impl ArmRequest {
    pub fn new(operation: impl Into<String>, method: Method, url: Url, accepted: &'static [u16]) -> Self {
        Self {
            operation: operation.into(),
            method,
            url,
            body: None,
            accepted,
        }
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ArmError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ArmError::RequestPreparation {
            operation: self.operation.clone(),
            reason: format!("failed to serialize request body: {e}"),
        })?;
        self.body = Some(bytes);
        Ok(self)
    }
}

/// A response whose status was among the accepted ones.
#[derive(Debug, Clone)]
pub(crate) struct ArmResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(serde::Deserialize)]
struct CloudError {
    error: CloudErrorBody,
}

#[derive(serde::Deserialize)]
struct CloudErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderState {
    registration_state: Option<String>,
}

/// Authenticated, retrying access to one subscription of the ARM control plane.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    base_uri: Url,
    subscription_id: String,
    access_token: Option<String>,
    options: ClientOptions,
}

impl fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmClient")
            .field("base_uri", &self.base_uri.as_str())
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

impl ArmClient {
    /// Create a client for `subscription_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::ConfigError`] if the base URI is not an absolute URL
    /// or the HTTP client cannot be built.
    pub fn new(subscription_id: impl Into<String>, options: ClientOptions) -> Result<Self, ArmError> {
        let base_uri = Url::parse(&options.base_uri).map_err(|e| ArmError::ConfigError {
            message: format!("invalid base URI '{}': {e}", options.base_uri),
        })?;
        if base_uri.cannot_be_a_base() {
            return Err(ArmError::ConfigError {
                message: format!("base URI '{}' cannot carry a path", options.base_uri),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| ArmError::ConfigError {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_uri,
            subscription_id: subscription_id.into(),
            access_token: None,
            options,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Build `{base}/{segments...}?api-version={api_version}` with each segment percent-encoded.
    pub(crate) fn url(
        &self,
        operation: &str,
        segments: &[&str],
        api_version: &str,
    ) -> Result<Url, ArmError> {
        let mut url = self.base_uri.clone();
        url.path_segments_mut()
            .map_err(|()| ArmError::RequestPreparation {
                operation: operation.to_string(),
                reason: format!("base URI '{}' cannot carry a path", self.base_uri),
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Resolve a continuation link, which may be absolute or relative to the base URI.
    pub(crate) fn resolve_link(&self, operation: &str, link: &str) -> Result<Url, ArmError> {
        self.base_uri.join(link).map_err(|e| ArmError::RequestPreparation {
            operation: operation.to_string(),
            reason: format!("invalid continuation link '{link}': {e}"),
        })
    }

    /// Send a request and decode the JSON response body.
    pub(crate) async fn call<T: DeserializeOwned>(&self, request: &ArmRequest) -> Result<T, ArmError> {
        let response = self.send(request).await?;
        serde_json::from_slice(&response.body).map_err(|e| ArmError::Server {
            operation: request.operation.clone(),
            status: response.status,
            kind: ServerErrorKind::Other,
            code: None,
            message: format!("failed to decode response body: {e}"),
        })
    }

    /// Send a request, retrying transient failures and registering missing providers.
    pub(crate) async fn send(&self, request: &ArmRequest) -> Result<ArmResponse, ArmError> {
        let registration_attempted = AtomicBool::new(false);
        let registration_attempted = &registration_attempted;
        let client = self;

        RetryIf::start(
            self.options.retry.delays(),
            move || async move {
                match client.send_once(request).await {
                    Err(error)
                        if client.options.register_providers
                            && is_missing_registration(&error)
                            && !registration_attempted.swap(true, Ordering::SeqCst) =>
                    {
                        let Some(namespace) = provider_namespace(&request.url) else {
                            return Err(error);
                        };
                        client.register_provider(&namespace).await?;
                        client.send_once(request).await
                    }
                    other => other,
                }
            },
            |error: &ArmError| {
                let retry = error.is_retryable();
                if retry {
                    warn!(target: "client::http", operation = %request.operation, "Retrying after transient failure: {error}");
                }
                retry
            },
        )
        .await
    }

    /// One attempt: no retries, no registration.
    async fn send_once(&self, request: &ArmRequest) -> Result<ArmResponse, ArmError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            target: "client::http",
            operation = %request.operation,
            method = %request.method,
            url = %request.url,
            request_id = %request_id,
            "Sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(CLIENT_REQUEST_ID_HEADER, &request_id);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(body.clone());
        }

        let response = builder.send().await.map_err(|e| ArmError::Transport {
            operation: request.operation.clone(),
            reason: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| ArmError::Transport {
            operation: request.operation.clone(),
            reason: format!("failed to read response body: {e}"),
        })?;

        debug!(target: "client::http", operation = %request.operation, status, "Received response");

        if request.accepted.contains(&status) {
            Ok(ArmResponse {
                status,
                body: body.to_vec(),
            })
        } else {
            Err(server_error(&request.operation, status, &body))
        }
    }

    /// Register a provider namespace and wait until it reports `Registered`.
    async fn register_provider(&self, namespace: &str) -> Result<(), ArmError> {
        let failed = |reason: String| ArmError::ProviderRegistration {
            namespace: namespace.to_string(),
            reason,
        };
        let operation = format!("Providers.Register({namespace})");
        warn!(target: "client::http", namespace, "Provider not registered; registering");

        let register_url = self
            .url(
                &operation,
                &["subscriptions", &self.subscription_id, "providers", namespace, "register"],
                PROVIDER_REGISTRATION_API_VERSION,
            )
            .map_err(|e| failed(e.to_string()))?;
        self.send_once(&ArmRequest::new(&operation, Method::POST, register_url, &[200]))
            .await
            .map_err(|e| failed(e.to_string()))?;

        let state_url = self
            .url(
                &operation,
                &["subscriptions", &self.subscription_id, "providers", namespace],
                PROVIDER_REGISTRATION_API_VERSION,
            )
            .map_err(|e| failed(e.to_string()))?;
        let poll = ArmRequest::new(&operation, Method::GET, state_url, &[200]);

        for attempt in 1..=self.options.registration_poll_attempts {
            let response = self.send_once(&poll).await.map_err(|e| failed(e.to_string()))?;
            let state: ProviderState = serde_json::from_slice(&response.body)
                .map_err(|e| failed(format!("unreadable provider state: {e}")))?;
            let state = state.registration_state.unwrap_or_default();
            if state.eq_ignore_ascii_case("Registered") {
                debug!(target: "client::http", namespace, attempt, "Provider registered");
                return Ok(());
            }
            debug!(target: "client::http", namespace, attempt, state = %state, "Waiting for provider registration");
            tokio::time::sleep(self.options.registration_poll_interval).await;
        }

        Err(failed(format!(
            "still not registered after {} checks",
            self.options.registration_poll_attempts
        )))
    }
}

fn is_missing_registration(error: &ArmError) -> bool {
    matches!(
        error,
        ArmError::Server { status: 409, code: Some(code), .. } if code == MISSING_REGISTRATION_CODE
    )
}

/// The segment following `providers` in an ARM resource path.
fn provider_namespace(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|s| s.eq_ignore_ascii_case("providers"))?;
    segments.next().filter(|s| !s.is_empty()).map(str::to_string)
}

fn server_error(operation: &str, status: u16, body: &[u8]) -> ArmError {
    let (code, message) = match serde_json::from_slice::<CloudError>(body) {
        Ok(CloudError {
            error,
        }) => (error.code, error.message.unwrap_or_default()),
        Err(_) => (None, String::from_utf8_lossy(body).trim().to_string()),
    };
    let message = if message.is_empty() {
        format!("HTTP status {status}")
    } else {
        message
    };
    ArmError::Server {
        operation: operation.to_string(),
        status,
        kind: ServerErrorKind::from_status(status),
        code,
        message,
    }
}
