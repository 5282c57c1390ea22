//! Assembling resource descriptions into a deployment template.
//!
//! [`TemplateAssembler`] collects resources and parameters in caller order and
//! [`TemplateAssembler::assemble`] validates the set as a whole before producing
//! an immutable [`Template`]. Validation runs in a fixed order and stops at the
//! first failure:
//!
//! 1. `(kind, name)` pairs are unique ([`ArmError::DuplicateResource`])
//! 2. every `dependsOn` entry names a resource of the template
//!    ([`ArmError::DanglingDependency`])
//! 3. dependencies are acyclic ([`ArmError::CircularDependency`])
//! 4. every `parameters('x')` reference is declared
//!    ([`ArmError::UndeclaredParameter`])
//!
//! # Example
//!
//! ```rust
//! use armgen_cli::template::{TemplateAssembler, builders};
//!
//! let [a_to_b, b_to_a] = builders::virtual_network_peerings("vnetA", "vnetB")?;
//! let template = TemplateAssembler::new()
//!     .add_resource(builders::virtual_network("vnetA", &["10.0.0.0/16"])?)
//!     .add_resource(builders::virtual_network("vnetB", &["10.1.0.0/16"])?)
//!     .add_resource(a_to_b)
//!     .add_resource(b_to_a)
//!     .assemble()?;
//!
//! let json = template.to_json_string(true)?;
//! assert!(json.contains("vnetA/peering-vnetB"));
//! # Ok::<(), armgen_cli::core::ArmError>(())
//! ```

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::dependency_graph::DependencyGraph;
use super::expression::TemplateValue;
use super::resource::{ResourceDescription, ResourceRef};
use crate::constants::{DEFAULT_CONTENT_VERSION, DEPLOYMENT_TEMPLATE_SCHEMA, GENERATOR_NAME};
use crate::core::ArmError;

/// Minimum similarity for a resource name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Data type of a template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    SecureString,
    Int,
    Bool,
    Object,
    Array,
}

/// `metadata` block of a template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub description: String,
}

/// A declared template parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<TemplateValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<TemplateValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ParameterMetadata>,
}

impl TemplateParameter {
    pub fn new(parameter_type: ParameterType) -> Self {
        Self {
            parameter_type,
            default_value: None,
            allowed_values: Vec::new(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<TemplateValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_allowed_values(mut self, values: Vec<TemplateValue>) -> Self {
        self.allowed_values = values;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata = Some(ParameterMetadata {
            description: description.into(),
        });
        self
    }
}

/// Collects resources and parameters for one template.
#[derive(Debug, Clone)]
pub struct TemplateAssembler {
    content_version: String,
    parameters: BTreeMap<String, TemplateParameter>,
    resources: Vec<ResourceDescription>,
}

impl Default for TemplateAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateAssembler {
    pub fn new() -> Self {
        Self {
            content_version: DEFAULT_CONTENT_VERSION.to_string(),
            parameters: BTreeMap::new(),
            resources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_content_version(mut self, version: impl Into<String>) -> Self {
        self.content_version = version.into();
        self
    }

    /// Declare a template parameter. A later declaration with the same name wins.
    #[must_use]
    pub fn add_parameter(mut self, name: impl Into<String>, parameter: TemplateParameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    /// Append a resource; output order follows insertion order.
    #[must_use]
    pub fn add_resource(mut self, resource: ResourceDescription) -> Self {
        self.resources.push(resource);
        self
    }

    #[must_use]
    pub fn add_resources(mut self, resources: impl IntoIterator<Item = ResourceDescription>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// Validate the collected set and freeze it into a [`Template`].
    ///
    /// # Errors
    ///
    /// Returns the first integrity failure found; no partial template is produced.
    pub fn assemble(self) -> Result<Template, ArmError> {
        let Self {
            content_version,
            parameters,
            resources,
        } = self;

        debug!(
            target: "template::assembler",
            resources = resources.len(),
            parameters = parameters.len(),
            "Assembling template"
        );

        let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(resources.len());
        for (position, resource) in resources.iter().enumerate() {
            let reference = resource.reference();
            if index.insert(reference.normalized(), position).is_some() {
                return Err(ArmError::DuplicateResource {
                    name: reference.display_name(),
                    kind: reference.kind,
                });
            }
        }

        let mut graph = DependencyGraph::new();
        for resource in &resources {
            let reference = resource.reference();
            graph.add_resource(reference.clone());
            for dependency in resource.dependencies() {
                if !index.contains_key(&dependency.normalized()) {
                    return Err(ArmError::DanglingDependency {
                        resource: reference.to_string(),
                        reference: dependency.to_string(),
                        closest: closest_name(dependency, &resources),
                    });
                }
                graph.add_dependency(reference.clone(), dependency.clone());
            }
        }

        let order = graph.topological_order()?;

        for resource in &resources {
            let mut undeclared = None;
            resource.for_each_expression(&mut |expression| {
                if undeclared.is_none() {
                    undeclared = expression
                        .parameter_references()
                        .into_iter()
                        .find(|name| !parameters.contains_key(name));
                }
            });
            if let Some(parameter) = undeclared {
                return Err(ArmError::UndeclaredParameter {
                    resource: resource.reference().to_string(),
                    parameter,
                });
            }
        }

        let deployment_order = order
            .iter()
            .filter_map(|reference| index.get(&reference.normalized()).copied())
            .collect();
        let template_hash = compute_hash(&parameters, &resources)?;

        debug!(target: "template::assembler", hash = %template_hash, "Template assembled");

        Ok(Template {
            content_version,
            parameters,
            resources,
            deployment_order,
            template_hash,
        })
    }
}

/// The most similar resource name of the same kind, if close enough to suggest.
fn closest_name(missing: &ResourceRef, resources: &[ResourceDescription]) -> Option<String> {
    let wanted = missing.display_name();
    resources
        .iter()
        .filter(|r| r.kind().eq_ignore_ascii_case(&missing.kind))
        .map(|r| r.reference().display_name())
        .map(|name| (strsim::normalized_levenshtein(&name, &wanted), name))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name)
}

fn compute_hash(
    parameters: &BTreeMap<String, TemplateParameter>,
    resources: &[ResourceDescription],
) -> Result<String, ArmError> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(parameters)?);
    hasher.update(serde_json::to_vec(resources)?);
    Ok(hex::encode(hasher.finalize()))
}

/// A validated deployment template.
///
/// Templates are immutable; build a new one through [`TemplateAssembler`] to
/// change anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    content_version: String,
    parameters: BTreeMap<String, TemplateParameter>,
    resources: Vec<ResourceDescription>,
    deployment_order: Vec<usize>,
    template_hash: String,
}

impl Template {
    pub fn content_version(&self) -> &str {
        &self.content_version
    }

    pub fn parameters(&self) -> &BTreeMap<String, TemplateParameter> {
        &self.parameters
    }

    /// Resources in the order they were added.
    pub fn resources(&self) -> &[ResourceDescription] {
        &self.resources
    }

    /// Look up a resource by kind and name, case-insensitively.
    pub fn resource(&self, kind: &str, name: &str) -> Option<&ResourceDescription> {
        let wanted = ResourceRef::new(kind, name).normalized();
        self.resources.iter().find(|r| r.reference().normalized() == wanted)
    }

    /// Resources ordered so that each one follows everything it depends on.
    pub fn deployment_order(&self) -> Vec<&ResourceDescription> {
        self.deployment_order.iter().map(|&i| &self.resources[i]).collect()
    }

    /// Hex SHA-256 over the canonical parameter and resource JSON.
    pub fn template_hash(&self) -> &str {
        &self.template_hash
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, ArmError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String, ArmError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Parse a template document and re-run every assembly check on it.
    ///
    /// The stored `templateHash` is ignored and recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::InvalidTemplate`] for malformed documents and the
    /// usual assembly errors for integrity failures.
    pub fn from_json_str(json: &str) -> Result<Self, ArmError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ArmError::InvalidTemplate {
                reason: format!("not valid JSON: {e}"),
            })?;
        let serde_json::Value::Object(mut document) = value else {
            return Err(ArmError::InvalidTemplate {
                reason: "the document root must be a JSON object".to_string(),
            });
        };

        let mut assembler = TemplateAssembler::new();
        match document.remove("contentVersion") {
            Some(serde_json::Value::String(version)) => {
                assembler = assembler.with_content_version(version);
            }
            Some(other) => {
                return Err(ArmError::InvalidTemplate {
                    reason: format!("contentVersion must be a string, found {other}"),
                });
            }
            None => {}
        }

        if let Some(parameters) = document.remove("parameters") {
            let parameters: BTreeMap<String, TemplateParameter> = serde_json::from_value(parameters)
                .map_err(|e| ArmError::InvalidTemplate {
                    reason: format!("invalid parameters section: {e}"),
                })?;
            for (name, parameter) in parameters {
                assembler = assembler.add_parameter(name, parameter);
            }
        }

        let resources = match document.remove("resources") {
            Some(serde_json::Value::Array(resources)) => resources,
            Some(_) => {
                return Err(ArmError::InvalidTemplate {
                    reason: "resources must be an array".to_string(),
                });
            }
            None => {
                return Err(ArmError::InvalidTemplate {
                    reason: "the document has no resources array".to_string(),
                });
            }
        };
        for resource in resources {
            assembler = assembler.add_resource(ResourceDescription::from_json(resource)?);
        }

        assembler.assemble()
    }
}

struct Generator<'a> {
    hash: &'a str,
}

impl Serialize for Generator<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Generator", 3)?;
        state.serialize_field("name", GENERATOR_NAME)?;
        state.serialize_field("version", env!("CARGO_PKG_VERSION"))?;
        state.serialize_field("templateHash", self.hash)?;
        state.end()
    }
}

struct Metadata<'a> {
    generator: Generator<'a>,
}

impl Serialize for Metadata<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Metadata", 1)?;
        state.serialize_field("_generator", &self.generator)?;
        state.end()
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Template", 5)?;
        state.serialize_field("$schema", DEPLOYMENT_TEMPLATE_SCHEMA)?;
        state.serialize_field("contentVersion", &self.content_version)?;
        state.serialize_field(
            "metadata",
            &Metadata {
                generator: Generator {
                    hash: &self.template_hash,
                },
            },
        )?;
        state.serialize_field("parameters", &self.parameters)?;
        state.serialize_field("resources", &self.resources)?;
        state.end()
    }
}
