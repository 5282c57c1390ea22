//! Assembled templates survive serialization and re-validation.

use armgen_cli::core::ArmError;
use armgen_cli::manifest::Manifest;
use armgen_cli::template::{
    ParameterType, ResourceDescription, Template, TemplateAssembler, TemplateExpression,
    TemplateParameter, builders,
};
use armgen_cli::test_utils::SAMPLE_MANIFEST;
use std::path::Path;

#[test]
fn generated_template_parses_back_with_same_hash() {
    let manifest = Manifest::parse(SAMPLE_MANIFEST, Path::new("armgen.toml")).unwrap();
    let template = manifest.build_template().unwrap();

    let reparsed = Template::from_json_str(&template.to_json_string(true).unwrap()).unwrap();
    assert_eq!(reparsed.template_hash(), template.template_hash());
    assert_eq!(reparsed.resources(), template.resources());
    assert_eq!(reparsed.content_version(), "1.2.0.0");
}

#[test]
fn compact_and_pretty_output_describe_the_same_document() {
    let template = TemplateAssembler::new()
        .add_resource(builders::public_ip_address("pip").unwrap())
        .assemble()
        .unwrap();
    let compact: serde_json::Value =
        serde_json::from_str(&template.to_json_string(false).unwrap()).unwrap();
    let pretty: serde_json::Value =
        serde_json::from_str(&template.to_json_string(true).unwrap()).unwrap();
    assert_eq!(compact, pretty);
    assert_eq!(compact, template.to_json_value().unwrap());
}

#[test]
fn declared_parameters_satisfy_references() {
    let resource = builders::public_ip_address("pip")
        .unwrap()
        .with_tag("owner", TemplateExpression::parameter("owner"));

    let err = TemplateAssembler::new().add_resource(resource.clone()).assemble().unwrap_err();
    assert!(matches!(err, ArmError::UndeclaredParameter { ref parameter, .. } if parameter == "owner"));

    let template = TemplateAssembler::new()
        .add_parameter("owner", TemplateParameter::new(ParameterType::String).with_default("platform"))
        .add_resource(resource)
        .assemble()
        .unwrap();
    let json = template.to_json_value().unwrap();
    assert_eq!(json["parameters"]["owner"]["defaultValue"], "platform");
    assert_eq!(json["resources"][0]["tags"]["owner"], "[parameters('owner')]");
}

#[test]
fn unknown_kinds_need_an_explicit_api_version() {
    let err = ResourceDescription::new("Microsoft.Storage/storageAccounts", "data").unwrap_err();
    assert!(matches!(err, ArmError::UnknownResourceKind { .. }));

    let account =
        ResourceDescription::with_api_version("Microsoft.Storage/storageAccounts", "2023-01-01", "data")
            .unwrap();
    let template = TemplateAssembler::new().add_resource(account).assemble().unwrap();
    assert_eq!(template.resources()[0].api_version(), "2023-01-01");
}
