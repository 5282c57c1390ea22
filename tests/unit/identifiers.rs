//! Identifier validation shared by every client verb.

use armgen_cli::client::ParentIdentity;
use armgen_cli::client::identifiers::{
    validate_resource_group_name, validate_resource_name, validate_subscription_id,
};
use armgen_cli::core::ArmError;

fn parameter_of(result: Result<(), ArmError>) -> String {
    match result {
        Err(ArmError::Validation {
            parameter,
            ..
        }) => parameter,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn resource_name_boundaries() {
    assert!(validate_resource_name("childResourceName", "a").is_ok());
    assert!(validate_resource_name("childResourceName", &"a".repeat(63)).is_ok());
    assert!(validate_resource_name("childResourceName", &"a".repeat(64)).is_err());
    assert!(validate_resource_name("childResourceName", "idp_1-prod").is_ok());
    assert!(validate_resource_name("childResourceName", "idp.1").is_err());
}

#[test]
fn resource_group_boundaries() {
    assert!(validate_resource_group_name(&"g".repeat(90)).is_ok());
    assert_eq!(parameter_of(validate_resource_group_name(&"g".repeat(91))), "resourceGroupName");
    assert_eq!(parameter_of(validate_resource_group_name("")), "resourceGroupName");
}

#[test]
fn subscription_must_not_be_blank() {
    assert_eq!(parameter_of(validate_subscription_id("  ")), "subscriptionId");
}

#[test]
fn parent_reports_first_invalid_identifier() {
    let parent = ParentIdentity::new("", "", "-");
    assert_eq!(parameter_of(parent.validate()), "subscriptionId");

    let parent = ParentIdentity::new("sub", "rg", "-");
    assert_eq!(parameter_of(parent.validate()), "resourceName");

    assert!(ParentIdentity::new("sub", "rg", "cluster").validate().is_ok());
}
