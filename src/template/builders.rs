//! One constructor per supported resource kind.
//!
//! Each builder fixes kind, API version and the semantic defaults of its
//! resource, so call sites only pass the names that vary between deployments.
//! Builders are pure: the only failure is [`ArmError::Validation`] for a
//! malformed name.
//!
//! ```rust
//! use armgen_cli::template::builders;
//!
//! let [forward, backward] = builders::virtual_network_peerings("hub", "spoke").unwrap();
//! assert_eq!(forward.name().as_str(), Some("hub/peering-spoke"));
//! assert_eq!(backward.name().as_str(), Some("spoke/peering-hub"));
//! ```

use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

use super::api_versions::{ACTION_GROUP, PUBLIC_IP_ADDRESS, VIRTUAL_NETWORK, VIRTUAL_NETWORK_PEERING};
use super::expression::{TemplateExpression, TemplateValue};
use super::resource::{ResourceDescription, ResourceRef};
use crate::constants::GLOBAL_LOCATION;
use crate::core::ArmError;

const MAX_NAME_LENGTH: usize = 80;
const MAX_SHORT_NAME_LENGTH: usize = 12;

static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid"));

fn validate_name(parameter: &str, value: &str) -> Result<(), ArmError> {
    let length = value.chars().count();
    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(ArmError::validation(
            parameter,
            format!("length must be between 1 and {MAX_NAME_LENGTH}, got {length}"),
        ));
    }
    if !RESOURCE_NAME.is_match(value) {
        return Err(ArmError::validation(
            parameter,
            format!("'{value}' may only contain letters, digits, '.', '_' and '-'"),
        ));
    }
    Ok(())
}

fn validate_address_prefix(prefix: &str) -> Result<(), ArmError> {
    let malformed = || {
        ArmError::validation(
            "addressPrefixes",
            format!("'{prefix}' is not a CIDR block such as 10.0.0.0/16"),
        )
    };
    let (address, length) = prefix.split_once('/').ok_or_else(malformed)?;
    let address: IpAddr = address.parse().map_err(|_| malformed())?;
    let length: u8 = length.parse().map_err(|_| malformed())?;
    let max = if address.is_ipv4() {
        32
    } else {
        128
    };
    if length > max {
        return Err(malformed());
    }
    Ok(())
}

/// `Microsoft.Insights/actionGroups`: enabled, global, with a short display name.
///
/// # Errors
///
/// Fails when `name` is malformed or `short_name` is not 1–12 characters.
pub fn action_group(name: &str, short_name: &str) -> Result<ResourceDescription, ArmError> {
    validate_name("name", name)?;
    let short_length = short_name.chars().count();
    if short_length == 0 || short_length > MAX_SHORT_NAME_LENGTH {
        return Err(ArmError::validation(
            "groupShortName",
            format!("length must be between 1 and {MAX_SHORT_NAME_LENGTH}, got {short_length}"),
        ));
    }

    Ok(ResourceDescription::new(ACTION_GROUP, name)?
        .with_location(GLOBAL_LOCATION)
        .with_property("groupShortName", short_name)
        .with_property("enabled", true))
}

/// `Microsoft.Network/publicIPAddresses`: Standard SKU with static allocation.
pub fn public_ip_address(name: &str) -> Result<ResourceDescription, ArmError> {
    validate_name("name", name)?;

    Ok(ResourceDescription::new(PUBLIC_IP_ADDRESS, name)?
        .with_sku(TemplateValue::object([("name", "Standard")]))
        .with_property("publicIPAllocationMethod", "Static"))
}

/// `Microsoft.Network/virtualNetworks` spanning the given address prefixes.
pub fn virtual_network(name: &str, address_prefixes: &[&str]) -> Result<ResourceDescription, ArmError> {
    validate_name("name", name)?;
    if address_prefixes.is_empty() {
        return Err(ArmError::validation("addressPrefixes", "at least one prefix is required"));
    }
    for prefix in address_prefixes {
        validate_address_prefix(prefix)?;
    }

    let prefixes: Vec<TemplateValue> =
        address_prefixes.iter().map(|p| TemplateValue::from(*p)).collect();
    Ok(ResourceDescription::new(VIRTUAL_NETWORK, name)?
        .with_property("addressSpace", TemplateValue::object([("addressPrefixes", prefixes)])))
}

/// One direction of a virtual network peering, from `local` to `remote`.
///
/// The peering is a child of `local`, named `{local}/peering-{remote}`, and
/// depends on both networks. Use [`virtual_network_peerings`] to get both
/// directions at once.
pub fn virtual_network_peering(local: &str, remote: &str) -> Result<ResourceDescription, ArmError> {
    validate_name("localNetwork", local)?;
    validate_name("remoteNetwork", remote)?;
    if local.eq_ignore_ascii_case(remote) {
        return Err(ArmError::validation(
            "remoteNetwork",
            format!("a network cannot be peered with itself ('{local}')"),
        ));
    }

    let remote_id = TemplateExpression::resource_id(VIRTUAL_NETWORK, remote);
    Ok(ResourceDescription::new(VIRTUAL_NETWORK_PEERING, format!("{local}/peering-{remote}"))?
        .with_property("allowVirtualNetworkAccess", true)
        .with_property("allowForwardedTraffic", true)
        .with_property("allowGatewayTransit", false)
        .with_property("useRemoteGateways", false)
        .with_property("remoteVirtualNetwork", TemplateValue::object([("id", remote_id)]))
        .depends_on(ResourceRef::new(VIRTUAL_NETWORK, local))
        .depends_on(ResourceRef::new(VIRTUAL_NETWORK, remote)))
}

/// Both directions of a peering between `a` and `b`: `[a → b, b → a]`.
pub fn virtual_network_peerings(a: &str, b: &str) -> Result<[ResourceDescription; 2], ArmError> {
    Ok([virtual_network_peering(a, b)?, virtual_network_peering(b, a)?])
}
