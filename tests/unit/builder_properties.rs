//! Every builder's output reads back unchanged for any valid resource name.

use armgen_cli::template::api_versions::{
    ACTION_GROUP, PUBLIC_IP_ADDRESS, VIRTUAL_NETWORK, VIRTUAL_NETWORK_PEERING,
};
use armgen_cli::template::{
    ParameterType, ResourceDescription, ResourceRef, Template, TemplateAssembler,
    TemplateExpression, TemplateParameter, TemplateValue, builders,
};
use proptest::prelude::*;

/// Azure resource identifiers: alphanumeric ends, `-` and `_` inside, 1–63 characters.
fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]([-_a-zA-Z0-9]{0,61}[a-zA-Z0-9])?"
}

fn arb_short_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,12}"
}

fn read_back(resource: &ResourceDescription) -> (serde_json::Value, ResourceDescription) {
    let json = serde_json::to_value(resource).unwrap();
    let parsed = ResourceDescription::from_json(json.clone()).unwrap();
    (json, parsed)
}

proptest! {
    #[test]
    fn action_group_reads_back(name in arb_identifier(), short in arb_short_name()) {
        let group = builders::action_group(&name, &short).unwrap();
        let (json, parsed) = read_back(&group);

        prop_assert_eq!(&json["type"], ACTION_GROUP);
        prop_assert_eq!(&json["name"], name.as_str());
        prop_assert_eq!(parsed.kind(), ACTION_GROUP);
        prop_assert_eq!(parsed.api_version(), group.api_version());
        prop_assert_eq!(parsed.name(), &TemplateValue::from(name.as_str()));
        prop_assert!(parsed.dependencies().is_empty());
        prop_assert_eq!(parsed, group);
    }

    #[test]
    fn public_ip_address_reads_back(name in arb_identifier()) {
        let pip = builders::public_ip_address(&name).unwrap();
        let (json, parsed) = read_back(&pip);

        prop_assert_eq!(&json["type"], PUBLIC_IP_ADDRESS);
        prop_assert!(json.get("dependsOn").is_none());
        prop_assert_eq!(parsed.kind(), PUBLIC_IP_ADDRESS);
        prop_assert_eq!(parsed.api_version(), pip.api_version());
        prop_assert_eq!(parsed.name(), &TemplateValue::from(name.as_str()));
        prop_assert!(parsed.dependencies().is_empty());
        prop_assert_eq!(parsed, pip);
    }

    #[test]
    fn virtual_network_reads_back(name in arb_identifier()) {
        let vnet = builders::virtual_network(&name, &["10.0.0.0/16", "fd00::/48"]).unwrap();
        let (json, parsed) = read_back(&vnet);

        prop_assert_eq!(&json["type"], VIRTUAL_NETWORK);
        prop_assert_eq!(parsed.kind(), VIRTUAL_NETWORK);
        prop_assert_eq!(parsed.api_version(), vnet.api_version());
        prop_assert_eq!(parsed.name(), &TemplateValue::from(name.as_str()));
        prop_assert!(parsed.dependencies().is_empty());
        prop_assert_eq!(parsed, vnet);
    }

    #[test]
    fn virtual_network_peering_reads_back(local in arb_identifier(), remote in arb_identifier()) {
        prop_assume!(!local.eq_ignore_ascii_case(&remote));

        let peering = builders::virtual_network_peering(&local, &remote).unwrap();
        let (json, parsed) = read_back(&peering);

        let depends_on = serde_json::json!([
            format!("[resourceId('{VIRTUAL_NETWORK}', '{local}')]"),
            format!("[resourceId('{VIRTUAL_NETWORK}', '{remote}')]"),
        ]);
        prop_assert_eq!(&json["dependsOn"], &depends_on);
        prop_assert_eq!(parsed.kind(), VIRTUAL_NETWORK_PEERING);
        prop_assert_eq!(parsed.api_version(), peering.api_version());
        let expected_name = format!("{local}/peering-{remote}");
        prop_assert_eq!(parsed.name(), &TemplateValue::from(expected_name.as_str()));
        prop_assert_eq!(
            parsed.dependencies(),
            &[
                ResourceRef::new(VIRTUAL_NETWORK, local.as_str()),
                ResourceRef::new(VIRTUAL_NETWORK, remote.as_str()),
            ]
        );
        prop_assert_eq!(parsed, peering);
    }

    #[test]
    fn expression_named_network_reads_back(parameter in arb_identifier(), pip_name in arb_identifier()) {
        let vnet = ResourceDescription::new(VIRTUAL_NETWORK, TemplateExpression::parameter(&parameter))
            .unwrap();
        let pip = builders::public_ip_address(&pip_name).unwrap().depends_on(vnet.reference());

        let template = TemplateAssembler::new()
            .add_parameter(parameter.as_str(), TemplateParameter::new(ParameterType::String))
            .add_resource(vnet.clone())
            .add_resource(pip)
            .assemble()
            .unwrap();
        let json = template.to_json_value().unwrap();
        prop_assert_eq!(
            &json["resources"][1]["dependsOn"],
            &serde_json::json!([format!("[resourceId('{VIRTUAL_NETWORK}', parameters('{parameter}'))]")])
        );

        let parsed = Template::from_json_str(&template.to_json_string(false).unwrap()).unwrap();
        prop_assert_eq!(parsed.resources()[1].dependencies(), &[vnet.reference()]);
        prop_assert_eq!(parsed.template_hash(), template.template_hash());
        prop_assert_eq!(parsed, template);
    }
}
