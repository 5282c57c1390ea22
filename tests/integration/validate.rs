use armgen_cli::test_utils::SAMPLE_MANIFEST;
use predicates::prelude::*;
use serde_json::{Value, json};

use crate::common::TestProject;

const PIP: &str = "Microsoft.Network/publicIPAddresses";

fn public_ip(name: &str, depends_on: &[&str]) -> Value {
    let mut resource = json!({
        "name": name,
        "type": PIP,
        "apiVersion": "2023-09-01",
        "properties": {}
    });
    if !depends_on.is_empty() {
        resource["dependsOn"] = depends_on
            .iter()
            .map(|d| format!("[resourceId('{PIP}', '{d}')]"))
            .collect::<Vec<_>>()
            .into();
    }
    resource
}

fn template_with(resources: Vec<Value>) -> String {
    json!({
        "$schema": "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#",
        "contentVersion": "1.0.0.0",
        "parameters": {},
        "resources": resources
    })
    .to_string()
}

/// A freshly generated template validates and its hash matches
#[test]
fn test_validate_generated_template() {
    let project = TestProject::new().unwrap();
    project.write_manifest(SAMPLE_MANIFEST).unwrap();
    project.run_armgen(&["generate"]).unwrap().assert_success();

    let output = project.run_armgen(&["validate", "azuredeploy.json"]).unwrap();
    output.assert_success().assert_stdout_contains("is valid (6 resource(s))");
    assert!(!output.stdout.contains("stale"), "unexpected warning: {}", output.stdout);
}

/// `--order` lists networks before the peerings that depend on them
#[test]
fn test_validate_prints_deployment_order() {
    let project = TestProject::new().unwrap();
    project.write_manifest(SAMPLE_MANIFEST).unwrap();
    project.run_armgen(&["generate"]).unwrap().assert_success();

    let output = project.run_armgen(&["validate", "azuredeploy.json", "--order"]).unwrap();
    output.assert_success().assert_stdout_contains("Deployment order:");

    let position = |needle: &str| output.stdout.find(needle).unwrap();
    let hub = position("Microsoft.Network/virtualNetworks/hub\n");
    let spoke = position("Microsoft.Network/virtualNetworks/spoke\n");
    let forward = position("virtualNetworkPeerings/hub/peering-spoke");
    let backward = position("virtualNetworkPeerings/spoke/peering-hub");
    assert!(hub < forward && spoke < forward);
    assert!(hub < backward && spoke < backward);
}

/// JSON output reports the hash and the deployment order
#[test]
fn test_validate_json_output() {
    let project = TestProject::new().unwrap();
    project
        .write_file("t.json", &template_with(vec![public_ip("b", &["a"]), public_ip("a", &[])]))
        .unwrap();

    let output =
        project.run_armgen(&["validate", "t.json", "--order", "--format", "json"]).unwrap();
    output.assert_success();

    let report: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["resources"], 2);
    assert_eq!(report["hashMatches"], false);
    assert_eq!(report["templateHash"].as_str().unwrap().len(), 64);
    assert_eq!(report["deploymentOrder"], json!([format!("{PIP}/a"), format!("{PIP}/b")]));
}

/// Hand edits after generation make the stored hash stale
#[test]
fn test_validate_warns_on_stale_hash() {
    let project = TestProject::new().unwrap();
    project
        .write_manifest("[[resources]]\nkind = \"public-ip-address\"\nname = \"pip\"\n")
        .unwrap();
    project.run_armgen(&["generate"]).unwrap().assert_success();

    let edited = project
        .read_file("azuredeploy.json")
        .unwrap()
        .replace("\"Static\"", "\"Dynamic\"");
    project.write_file("azuredeploy.json", &edited).unwrap();

    let output = project.run_armgen(&["validate", "azuredeploy.json"]).unwrap();
    output.assert_success().assert_stdout_contains("templateHash is missing or stale");
}

/// Dependency cycles are rejected with the cycle spelled out
#[test]
fn test_validate_rejects_cycle() {
    let project = TestProject::new().unwrap();
    project
        .write_file("t.json", &template_with(vec![public_ip("a", &["b"]), public_ip("b", &["a"])]))
        .unwrap();

    project
        .command()
        .args(["validate", "t.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency detected"))
        .stderr(predicate::str::contains("→"));
}

/// Duplicates are detected case-insensitively
#[test]
fn test_validate_rejects_duplicate() {
    let project = TestProject::new().unwrap();
    project
        .write_file("t.json", &template_with(vec![public_ip("pip", &[]), public_ip("PIP", &[])]))
        .unwrap();

    let output = project.run_armgen(&["validate", "t.json"]).unwrap();
    assert!(!output.success);
    output.assert_stderr_contains("Duplicate resource");
}

/// In JSON mode a failure still prints a report before exiting non-zero
#[test]
fn test_validate_json_failure_report() {
    let project = TestProject::new().unwrap();
    project
        .write_file("t.json", &template_with(vec![public_ip("a", &["missing"])]))
        .unwrap();

    let output = project.run_armgen(&["validate", "t.json", "--format", "json"]).unwrap();
    assert!(!output.success);
    let report: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert!(report["errors"][0].as_str().unwrap().contains("not part of the template"));
}

/// Documents that are not templates are rejected
#[test]
fn test_validate_rejects_malformed_document() {
    let project = TestProject::new().unwrap();
    project.write_file("t.json", "[1, 2, 3]").unwrap();

    project
        .command()
        .args(["validate", "t.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid template"));
}
