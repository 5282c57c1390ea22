//! Identifier validation performed before any request is prepared.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::core::ArmError;

/// Alphanumeric, or alphanumeric at both ends with hyphens/underscores inside.
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9]$|^[a-zA-Z0-9][-_a-zA-Z0-9]*[a-zA-Z0-9]$")
        .expect("static regex is valid")
});

const MAX_RESOURCE_GROUP_LENGTH: usize = 90;
const MAX_RESOURCE_NAME_LENGTH: usize = 63;

fn check_length(parameter: &str, value: &str, max: usize) -> Result<(), ArmError> {
    let length = value.chars().count();
    if length == 0 || length > max {
        return Err(ArmError::validation(
            parameter,
            format!("length must be between 1 and {max}, got {length}"),
        ));
    }
    Ok(())
}

pub fn validate_subscription_id(subscription_id: &str) -> Result<(), ArmError> {
    if subscription_id.trim().is_empty() {
        return Err(ArmError::validation("subscriptionId", "must not be empty"));
    }
    Ok(())
}

pub fn validate_resource_group_name(name: &str) -> Result<(), ArmError> {
    check_length("resourceGroupName", name, MAX_RESOURCE_GROUP_LENGTH)
}

/// Validate a parent or child resource name (1–63 characters, restricted alphabet).
pub fn validate_resource_name(parameter: &str, name: &str) -> Result<(), ArmError> {
    check_length(parameter, name, MAX_RESOURCE_NAME_LENGTH)?;
    if !RESOURCE_NAME.is_match(name) {
        return Err(ArmError::validation(
            parameter,
            format!(
                "'{name}' must be alphanumeric, with '-' or '_' allowed only between alphanumeric characters"
            ),
        ));
    }
    Ok(())
}

/// Identifies the parent resource a child collection hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentIdentity {
    pub subscription_id: String,
    pub resource_group: String,
    pub resource_name: String,
}

impl ParentIdentity {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            resource_name: resource_name.into(),
        }
    }

    /// Check every identifier, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), ArmError> {
        validate_subscription_id(&self.subscription_id)?;
        validate_resource_group_name(&self.resource_group)?;
        validate_resource_name("resourceName", &self.resource_name)
    }
}

impl fmt::Display for ParentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.subscription_id, self.resource_group, self.resource_name)
    }
}
