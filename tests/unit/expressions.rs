//! Expression rendering and literal escaping.

use armgen_cli::template::{TemplateExpression, TemplateValue};

#[test]
fn literal_in_brackets_is_escaped() {
    let value = TemplateValue::from("[not an expression]");
    assert_eq!(serde_json::to_string(&value).unwrap(), r#""[[not an expression]""#);
    assert_eq!(TemplateValue::parse_str("[[not an expression]"), value);
}

#[test]
fn expression_renders_with_brackets() {
    let value = TemplateValue::from(TemplateExpression::parameter("region"));
    assert_eq!(serde_json::to_string(&value).unwrap(), r#""[parameters('region')]""#);
    assert_eq!(TemplateValue::parse_str("[parameters('region')]"), value);
}

#[test]
fn quotes_in_names_are_doubled() {
    let expression = TemplateExpression::resource_id("Microsoft.Network/virtualNetworks", "o'brien");
    assert_eq!(expression.as_str(), "resourceId('Microsoft.Network/virtualNetworks', 'o''brien')");
    assert_eq!(
        expression.parse_resource_id(),
        Some(("Microsoft.Network/virtualNetworks".to_string(), "o'brien".to_string()))
    );
}

#[test]
fn nested_resource_ids_round_trip() {
    let kind = "Microsoft.Network/virtualNetworks/virtualNetworkPeerings";
    let expression = TemplateExpression::resource_id(kind, "hub/peering-spoke");
    assert_eq!(
        expression.parse_resource_id(),
        Some((kind.to_string(), "hub/peering-spoke".to_string()))
    );

    // Wrong number of name segments for the type depth
    let short = TemplateExpression::new(format!("resourceId('{kind}', 'hub')")).unwrap();
    assert_eq!(short.parse_resource_id(), None);
}

#[test]
fn parameter_references_are_collected() {
    let expression =
        TemplateExpression::new("concat(parameters('prefix'), '-', parameters('suffix'))").unwrap();
    assert_eq!(expression.parameter_references(), ["prefix", "suffix"]);
}

#[test]
fn bracketed_or_empty_bodies_are_rejected() {
    assert!(TemplateExpression::new("").is_err());
    assert!(TemplateExpression::new("[parameters('x')]").is_err());
}

#[test]
fn plain_strings_stay_literal() {
    for text in ["", "[]", "plain", "[unterminated"] {
        assert!(TemplateValue::parse_str(text).as_expression().is_none(), "{text:?}");
    }
}
