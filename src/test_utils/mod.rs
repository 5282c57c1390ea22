//! Test utilities for armgen
//!
//! Shared by the unit tests inside the crate and the `tests/` suites (through
//! the `test-utils` feature): one-time logging setup, canned manifests, and
//! JSON fixtures for the sync identity provider API.
//!
//! # Example
//!
//! ```rust,no_run
//! use armgen_cli::test_utils::{SAMPLE_MANIFEST, init_test_logging};
//!
//! init_test_logging(None);
//! std::fs::write("armgen.toml", SAMPLE_MANIFEST).unwrap();
//! ```

use serde_json::{Value, json};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::client::{
    ArmClient, ClientOptions, ParentIdentity, RetryPolicy, SYNC_IDENTITY_PROVIDERS,
};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Subscription id used by client fixtures.
pub const TEST_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";
/// Resource group used by client fixtures.
pub const TEST_RESOURCE_GROUP: &str = "test-rg";
/// Cluster name used by client fixtures.
pub const TEST_CLUSTER: &str = "test-cluster";

/// Two peered networks, a public IP, and an action group.
pub const SAMPLE_MANIFEST: &str = r#"[template]
content_version = "1.2.0.0"

[template.tags]
environment = "test"

[parameters.alertEmail]
type = "string"
description = "Where alerts are sent"

[[resources]]
kind = "virtual-network"
name = "hub"
address_prefixes = ["10.0.0.0/16"]

[[resources]]
kind = "virtual-network"
name = "spoke"
address_prefixes = ["10.1.0.0/16"]

[[resources]]
kind = "virtual-network-peering"
local = "hub"
remote = "spoke"

[[resources]]
kind = "public-ip-address"
name = "gateway-ip"

[[resources]]
kind = "action-group"
name = "on-call"
short_name = "oncall"
"#;

/// Initialize logging for tests.
///
/// Runs once per process. Uses `level` when given, otherwise `RUST_LOG`; with
/// neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Client options pointing at a mock server, with millisecond backoff.
pub fn mock_client_options(base_uri: &str) -> ClientOptions {
    ClientOptions {
        base_uri: base_uri.to_string(),
        retry: RetryPolicy {
            max_retries: 2,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(5),
        },
        registration_poll_interval: std::time::Duration::from_millis(1),
        ..ClientOptions::default()
    }
}

/// An authenticated [`ArmClient`] for [`TEST_SUBSCRIPTION`] against `base_uri`.
pub fn mock_arm_client(base_uri: &str) -> ArmClient {
    ArmClient::new(TEST_SUBSCRIPTION, mock_client_options(base_uri))
        .unwrap_or_else(|e| panic!("mock client options must be valid: {e}"))
        .with_access_token("test-token")
}

/// The parent cluster used by client fixtures.
pub fn test_parent() -> ParentIdentity {
    ParentIdentity::new(TEST_SUBSCRIPTION, TEST_RESOURCE_GROUP, TEST_CLUSTER)
}

/// Path of the sync identity provider collection for the test cluster.
pub fn sync_idp_collection_path() -> String {
    let t = &SYNC_IDENTITY_PROVIDERS;
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION}/resourceGroups/{TEST_RESOURCE_GROUP}/providers/{}/{}/{TEST_CLUSTER}/{}",
        t.provider, t.list_parent_type, t.list_segment
    )
}

/// Path of one sync identity provider of the test cluster.
pub fn sync_idp_item_path(name: &str) -> String {
    let t = &SYNC_IDENTITY_PROVIDERS;
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION}/resourceGroups/{TEST_RESOURCE_GROUP}/providers/{}/{}/{TEST_CLUSTER}/{}/{name}",
        t.provider, t.parent_type, t.item_segment
    )
}

/// A server-side sync identity provider document, including read-only fields.
pub fn sync_idp_json(name: &str, resources: &str) -> Value {
    json!({
        "id": sync_idp_item_path(name),
        "name": name,
        "type": "Microsoft.RedHatOpenShift/openShiftClusters/syncIdentityProviders",
        "properties": { "resources": resources },
        "systemData": {
            "createdBy": "someone@example.com",
            "createdByType": "User",
            "createdAt": "2024-01-01T00:00:00Z"
        }
    })
}
