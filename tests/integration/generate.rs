use armgen_cli::test_utils::SAMPLE_MANIFEST;
use predicates::prelude::*;
use serde_json::Value;

use crate::common::TestProject;

/// Generating from the sample manifest writes a complete template next to it
#[test]
fn test_generate_writes_template() {
    let project = TestProject::new().unwrap();
    project.write_manifest(SAMPLE_MANIFEST).unwrap();

    let output = project.run_armgen(&["generate"]).unwrap();
    output.assert_success().assert_stdout_contains("Generated 6 resource(s)");

    let template: Value = serde_json::from_str(&project.read_file("azuredeploy.json").unwrap()).unwrap();
    assert_eq!(
        template["$schema"],
        "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#"
    );
    assert_eq!(template["contentVersion"], "1.2.0.0");
    assert_eq!(template["metadata"]["_generator"]["name"], "armgen");
    assert_eq!(template["parameters"]["alertEmail"]["type"], "string");

    let resources = template["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 6);
    assert!(resources.iter().all(|r| r["tags"]["environment"] == "test"));

    let peering = resources.iter().find(|r| r["name"] == "hub/peering-spoke").unwrap();
    assert_eq!(peering["type"], "Microsoft.Network/virtualNetworks/virtualNetworkPeerings");
    assert_eq!(
        peering["dependsOn"],
        serde_json::json!([
            "[resourceId('Microsoft.Network/virtualNetworks', 'hub')]",
            "[resourceId('Microsoft.Network/virtualNetworks', 'spoke')]"
        ])
    );
    assert_eq!(
        peering["properties"]["remoteVirtualNetwork"]["id"],
        "[resourceId('Microsoft.Network/virtualNetworks', 'spoke')]"
    );

    let action_group = resources.iter().find(|r| r["name"] == "on-call").unwrap();
    assert_eq!(action_group["location"], "Global");
    assert!(action_group.get("dependsOn").is_none());
}

/// Field order of each resource follows the ARM convention
#[test]
fn test_generate_resource_field_order() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest("[[resources]]\nkind = \"public-ip-address\"\nname = \"pip\"\n")
        .unwrap();

    project.run_armgen(&["generate", "--compact"]).unwrap().assert_success();

    let template: Value = serde_json::from_str(&project.read_file("azuredeploy.json").unwrap()).unwrap();
    let top: Vec<&str> = template.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(top, ["$schema", "contentVersion", "metadata", "parameters", "resources"]);

    let fields: Vec<&str> =
        template["resources"][0].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(fields, ["name", "type", "apiVersion", "location", "properties", "sku"]);
}

/// `--output -` prints the template instead of writing a file
#[test]
fn test_generate_to_stdout() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest("[[resources]]\nkind = \"public-ip-address\"\nname = \"pip\"\n")
        .unwrap();

    let assert = project.command().args(["generate", "--output", "-"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let template: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(template["resources"][0]["type"], "Microsoft.Network/publicIPAddresses");
    assert!(!project.project_path().join("azuredeploy.json").exists());
}

/// An explicit manifest path and output path are honoured
#[test]
fn test_generate_explicit_paths() {
    let project = TestProject::new().unwrap();
    project.write_file("infra/network.toml", SAMPLE_MANIFEST).unwrap();

    project
        .command()
        .args(["generate", "--manifest", "infra/network.toml", "--output", "out/net.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("out/net.json").or(predicate::str::contains("out\\net.json")));

    assert!(project.project_path().join("out").join("net.json").exists());
}

/// Without a manifest the command fails with a hint
#[test]
fn test_generate_without_manifest() {
    let project = TestProject::new().unwrap();

    project
        .command()
        .arg("generate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Manifest file not found"))
        .stderr(predicate::str::contains("--manifest"));
}

/// A peering to an undeclared network is a dangling dependency and nothing is written
#[test]
fn test_generate_dangling_dependency() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[[resources]]
kind = "virtual-network"
name = "hub"
address_prefixes = ["10.0.0.0/16"]

[[resources]]
kind = "virtual-network-peering"
local = "hub"
remote = "spoke"
"#,
        )
        .unwrap();

    project
        .command()
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("which is not part of the template"))
        .stderr(predicate::str::contains("virtualNetworks/spoke"));

    assert!(!project.project_path().join("azuredeploy.json").exists());
}

/// Undeclared parameters referenced from tags are rejected
#[test]
fn test_generate_undeclared_parameter() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest(
            r#"
[template.tags]
owner = "[parameters('owner')]"

[[resources]]
kind = "public-ip-address"
name = "pip"
"#,
        )
        .unwrap();

    let output = project.run_armgen(&["generate"]).unwrap();
    assert!(!output.success);
    output.assert_stderr_contains("undeclared template parameter 'owner'");
}

/// Syntax errors name the manifest file
#[test]
fn test_generate_invalid_manifest() {
    let project = TestProject::new().unwrap();
    project.write_manifest("[[resources]\nkind = ").unwrap();

    let output = project.run_armgen(&["generate"]).unwrap();
    assert!(!output.success);
    output.assert_stderr_contains("Invalid manifest file syntax");
}

/// Builder validation failures surface before anything is written
#[test]
fn test_generate_invalid_resource_name() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest("[[resources]]\nkind = \"public-ip-address\"\nname = \"bad name!\"\n")
        .unwrap();

    let output = project.run_armgen(&["generate"]).unwrap();
    assert!(!output.success);
    output.assert_stderr_contains("Invalid value for 'name'");
    assert!(!project.project_path().join("azuredeploy.json").exists());
}
