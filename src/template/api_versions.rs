//! Resource kinds known to the builders and the API version each one is emitted with.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::core::ArmError;

/// `Microsoft.Insights/actionGroups`
pub const ACTION_GROUP: &str = "Microsoft.Insights/actionGroups";
/// `Microsoft.Network/publicIPAddresses`
pub const PUBLIC_IP_ADDRESS: &str = "Microsoft.Network/publicIPAddresses";
/// `Microsoft.Network/virtualNetworks`
pub const VIRTUAL_NETWORK: &str = "Microsoft.Network/virtualNetworks";
/// `Microsoft.Network/virtualNetworks/virtualNetworkPeerings`
pub const VIRTUAL_NETWORK_PEERING: &str = "Microsoft.Network/virtualNetworks/virtualNetworkPeerings";

static API_VERSIONS: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        (ACTION_GROUP, "2018-03-01"),
        (PUBLIC_IP_ADDRESS, "2019-07-01"),
        (VIRTUAL_NETWORK, "2019-07-01"),
        (VIRTUAL_NETWORK_PEERING, "2019-07-01"),
    ])
});

static API_VERSION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(-[a-z]+)?$").expect("static regex is valid")
});

static KIND_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9]*(\.[A-Za-z][A-Za-z0-9]*)+(/[A-Za-z][A-Za-z0-9]*)+$")
        .expect("static regex is valid")
});

/// API version for a known resource kind.
///
/// Resource types are case-insensitive in ARM, so the lookup is too.
#[must_use]
pub fn api_version_for(kind: &str) -> Option<&'static str> {
    API_VERSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(kind))
        .map(|(_, version)| *version)
}

/// All known kinds with their API versions, sorted by kind.
pub fn known_kinds() -> impl Iterator<Item = (&'static str, &'static str)> {
    API_VERSIONS.iter().map(|(kind, version)| (*kind, *version))
}

/// Check that `kind` looks like `Namespace.Provider/type[/childType...]`.
pub fn validate_kind(kind: &str) -> Result<(), ArmError> {
    if KIND_FORMAT.is_match(kind) {
        Ok(())
    } else {
        Err(ArmError::validation(
            "type",
            format!("'{kind}' is not a resource type of the form 'Namespace.Provider/type'"),
        ))
    }
}

/// Check that `version` looks like `YYYY-MM-DD` with an optional `-preview` style suffix.
pub fn validate_api_version(version: &str) -> Result<(), ArmError> {
    if API_VERSION_FORMAT.is_match(version) {
        Ok(())
    } else {
        Err(ArmError::validation(
            "apiVersion",
            format!("'{version}' is not of the form YYYY-MM-DD[-suffix]"),
        ))
    }
}
