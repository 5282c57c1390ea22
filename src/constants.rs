//! Global constants used throughout the armgen codebase.
//!
//! This module contains endpoints, timeouts, retry parameters, and the fixed
//! strings that make up an ARM deployment template. Defining them centrally
//! keeps magic values discoverable and lets tests refer to the same numbers.

use std::time::Duration;

/// Default Azure Resource Manager endpoint for the public cloud.
pub const DEFAULT_BASE_URI: &str = "https://management.azure.com";

/// Schema URL written into every generated deployment template.
pub const DEPLOYMENT_TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";

/// Content version used when the manifest does not specify one.
pub const DEFAULT_CONTENT_VERSION: &str = "1.0.0.0";

/// Name recorded under `metadata._generator.name` in generated templates.
pub const GENERATOR_NAME: &str = "armgen";

/// Location expression resolving to the target resource group's region.
pub const RESOURCE_GROUP_LOCATION: &str = "resourceGroup().location";

/// Sentinel region used by global resources such as action groups.
pub const GLOBAL_LOCATION: &str = "Global";

/// Timeout applied to every HTTP request sent to the control plane (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of retries attempted for transient failures before giving up.
pub const DEFAULT_MAX_RETRIES: usize = 4;

/// Starting delay for exponential backoff (100ms).
///
/// The delay doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 100;

/// Maximum backoff delay for exponential backoff (10 seconds).
pub const MAX_BACKOFF_DELAY_MS: u64 = 10_000;

/// API version used for resource provider registration calls.
pub const PROVIDER_REGISTRATION_API_VERSION: &str = "2016-02-01";

/// Number of times provider registration state is polled before giving up.
pub const REGISTRATION_POLL_ATTEMPTS: usize = 20;

/// Delay between two provider registration state polls.
pub const REGISTRATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// ARM error code returned when a provider namespace is not registered.
pub const MISSING_REGISTRATION_CODE: &str = "MissingSubscriptionRegistration";

/// Header carrying the client-generated request id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Content type used for request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default manifest file name read by `armgen generate`.
pub const MANIFEST_FILE_NAME: &str = "armgen.toml";

/// Default output file written by `armgen generate`.
pub const DEFAULT_TEMPLATE_FILE_NAME: &str = "azuredeploy.json";
