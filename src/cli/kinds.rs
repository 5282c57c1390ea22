//! `armgen kinds`: list the resource kinds with a pinned API version.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::OutputFormat;
use crate::template::api_versions::{
    self, ACTION_GROUP, PUBLIC_IP_ADDRESS, VIRTUAL_NETWORK, VIRTUAL_NETWORK_PEERING,
};

/// Manifest `kind` tag for each resource type a builder exists for.
const MANIFEST_TAGS: &[(&str, &str)] = &[
    (ACTION_GROUP, "action-group"),
    (PUBLIC_IP_ADDRESS, "public-ip-address"),
    (VIRTUAL_NETWORK, "virtual-network"),
    (VIRTUAL_NETWORK_PEERING, "virtual-network-peering"),
];

/// List supported resource kinds.
#[derive(Args)]
pub struct KindsCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct KindEntry {
    kind: &'static str,
    api_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest_tag: Option<&'static str>,
}

fn entries() -> Vec<KindEntry> {
    api_versions::known_kinds()
        .map(|(kind, api_version)| KindEntry {
            kind,
            api_version,
            manifest_tag: MANIFEST_TAGS
                .iter()
                .find(|(known, _)| *known == kind)
                .map(|(_, tag)| *tag),
        })
        .collect()
}

impl KindsCommand {
    pub fn execute(self) -> Result<()> {
        let entries = entries();
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text => {
                let width = entries.iter().map(|e| e.kind.len()).max().unwrap_or(0);
                for entry in &entries {
                    let tag = entry
                        .manifest_tag
                        .map(|t| format!("  ({t})").dimmed().to_string())
                        .unwrap_or_default();
                    println!("{:<width$}  {}{tag}", entry.kind.bold(), entry.api_version.cyan());
                }
            }
        }
        Ok(())
    }
}
