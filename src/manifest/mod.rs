//! Manifest file (`armgen.toml`) parsing.
//!
//! The manifest is the declarative input of `armgen generate`: template
//! settings, template parameters, and the resources to emit. Each
//! `[[resources]]` entry is tagged with a `kind` naming one of the builders in
//! [`crate::template::builders`].
//!
//! # Format
//!
//! ```toml
//! [template]
//! content_version = "1.0.0.0"
//!
//! [template.tags]
//! owner = "platform"
//!
//! [parameters.alertEmail]
//! type = "string"
//! description = "Where alerts are sent"
//!
//! [[resources]]
//! kind = "virtual-network"
//! name = "hub"
//! address_prefixes = ["10.0.0.0/16"]
//!
//! [[resources]]
//! kind = "virtual-network"
//! name = "spoke"
//! address_prefixes = ["10.1.0.0/16"]
//!
//! # Expands to both directions
//! [[resources]]
//! kind = "virtual-network-peering"
//! local = "hub"
//! remote = "spoke"
//!
//! [[resources]]
//! kind = "public-ip-address"
//! name = "gateway-ip"
//!
//! [[resources]]
//! kind = "action-group"
//! name = "on-call"
//! short_name = "oncall"
//! ```
//!
//! String values written as `"[...]"` are template expressions, exactly as in
//! the generated JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_CONTENT_VERSION, MANIFEST_FILE_NAME};
use crate::core::ArmError;
use crate::template::{
    ParameterType, ResourceDescription, Template, TemplateAssembler, TemplateParameter,
    TemplateValue, builders,
};

/// `[template]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    #[serde(default = "default_content_version")]
    pub content_version: String,
    /// Tags applied to every generated resource.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, TemplateValue>,
}

fn default_content_version() -> String {
    DEFAULT_CONTENT_VERSION.to_string()
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            content_version: default_content_version(),
            tags: BTreeMap::new(),
        }
    }
}

/// `[parameters.<name>]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TemplateValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<TemplateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterSpec {
    fn to_parameter(&self) -> TemplateParameter {
        let mut parameter = TemplateParameter::new(self.parameter_type)
            .with_allowed_values(self.allowed_values.clone());
        if let Some(default) = &self.default {
            parameter = parameter.with_default(default.clone());
        }
        if let Some(description) = &self.description {
            parameter = parameter.with_description(description.clone());
        }
        parameter
    }
}

/// One `[[resources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ResourceSpec {
    ActionGroup {
        name: String,
        short_name: String,
    },
    PublicIpAddress {
        name: String,
    },
    VirtualNetwork {
        name: String,
        address_prefixes: Vec<String>,
    },
    /// Both directions of a peering between two networks.
    VirtualNetworkPeering {
        local: String,
        remote: String,
    },
}

impl ResourceSpec {
    /// Run the matching builder. Peerings produce two descriptions.
    pub fn build(&self) -> Result<Vec<ResourceDescription>, ArmError> {
        Ok(match self {
            Self::ActionGroup {
                name,
                short_name,
            } => vec![builders::action_group(name, short_name)?],
            Self::PublicIpAddress {
                name,
            } => vec![builders::public_ip_address(name)?],
            Self::VirtualNetwork {
                name,
                address_prefixes,
            } => {
                let prefixes: Vec<&str> = address_prefixes.iter().map(String::as_str).collect();
                vec![builders::virtual_network(name, &prefixes)?]
            }
            Self::VirtualNetworkPeering {
                local,
                remote,
            } => builders::virtual_network_peerings(local, remote)?.into(),
        })
    }
}

/// Parsed `armgen.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub template: TemplateSettings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceSpec>,
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// [`ArmError::ManifestNotFound`] if the file does not exist,
    /// [`ArmError::ManifestParseError`] if it is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ArmError::ManifestNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
        Ok(Self::parse(&content, path)?)
    }

    /// Parse manifest text; `origin` only labels errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ArmError> {
        toml::from_str(content).map_err(|e| ArmError::ManifestParseError {
            file: origin.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Build every resource and collect parameters into an assembler.
    pub fn to_assembler(&self) -> Result<TemplateAssembler, ArmError> {
        let mut assembler =
            TemplateAssembler::new().with_content_version(self.template.content_version.clone());
        for (name, spec) in &self.parameters {
            assembler = assembler.add_parameter(name.clone(), spec.to_parameter());
        }
        for spec in &self.resources {
            for mut resource in spec.build()? {
                for (key, value) in &self.template.tags {
                    resource = resource.with_tag(key.clone(), value.clone());
                }
                assembler = assembler.add_resource(resource);
            }
        }
        Ok(assembler)
    }

    /// Build and assemble the template in one step.
    pub fn build_template(&self) -> Result<Template, ArmError> {
        self.to_assembler()?.assemble()
    }
}

/// Find `armgen.toml` in the current directory or any parent.
pub fn find_manifest() -> Result<PathBuf> {
    let current = std::env::current_dir().context("Cannot determine current working directory")?;
    find_manifest_from(current)
}

/// Use `explicit_path` when given, otherwise search upward from the current directory.
pub fn find_manifest_with_optional(explicit_path: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_path {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(ArmError::ManifestNotFound {
            path: path.display().to_string(),
        }
        .into()),
        None => find_manifest(),
    }
}

/// Search for `armgen.toml` from `current` up to the filesystem root.
pub fn find_manifest_from(mut current: PathBuf) -> Result<PathBuf> {
    let start = current.clone();
    loop {
        let manifest_path = current.join(MANIFEST_FILE_NAME);
        if manifest_path.exists() {
            return Ok(manifest_path);
        }

        if !current.pop() {
            return Err(ArmError::ManifestNotFound {
                path: start.join(MANIFEST_FILE_NAME).display().to_string(),
            }
            .into());
        }
    }
}
