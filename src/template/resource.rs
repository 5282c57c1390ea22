//! The declarative description of one ARM resource.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::api_versions::{api_version_for, validate_api_version, validate_kind};
use super::expression::{NameSegment, TemplateExpression, TemplateValue};
use crate::core::ArmError;

/// A symbolic reference to another resource in the same template.
///
/// The name is held as `resourceId` segments, one per nested type level.
/// Rendered as `[resourceId('<kind>', <segment>, ...)]` in `dependsOn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub kind: String,
    segments: Vec<NameSegment>,
}

impl ResourceRef {
    /// Reference a resource by kind and name.
    ///
    /// Literal names are split on `/`. An expression name on a nested kind is
    /// addressed segment by segment with `split(<name>, '/')[i]`.
    pub fn new(kind: impl Into<String>, name: impl Into<TemplateValue>) -> Self {
        let kind = kind.into();
        let segments = match name.into() {
            TemplateValue::Expression(expression) => {
                let levels = type_levels(&kind);
                if levels <= 1 {
                    vec![NameSegment::Expression(expression)]
                } else {
                    (0..levels).map(|i| NameSegment::Expression(expression.name_segment(i))).collect()
                }
            }
            TemplateValue::String(text) => literal_segments(&text),
            other => literal_segments(&other.display_text()),
        };
        Self {
            kind,
            segments,
        }
    }

    /// Reference built from already separated segments, as read from a template.
    pub fn from_segments(kind: impl Into<String>, segments: Vec<NameSegment>) -> Self {
        Self {
            kind: kind.into(),
            segments,
        }
    }

    pub fn segments(&self) -> &[NameSegment] {
        &self.segments
    }

    /// The name for messages: segments joined with `/`, expressions in brackets.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.segments.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
    }

    /// The `resourceId(...)` expression addressing this resource.
    #[must_use]
    pub fn to_expression(&self) -> TemplateExpression {
        TemplateExpression::resource_id_from_segments(&self.kind, &self.segments)
    }

    /// Case-insensitive identity, matching how ARM compares types and names.
    ///
    /// Segments are keyed by their argument form, so a quoted literal never
    /// matches an expression.
    pub(crate) fn normalized(&self) -> (String, String) {
        let name = self
            .segments
            .iter()
            .map(NameSegment::to_argument)
            .collect::<Vec<_>>()
            .join(", ");
        (self.kind.to_ascii_lowercase(), name.to_ascii_lowercase())
    }
}

fn type_levels(kind: &str) -> usize {
    kind.split('/').count().saturating_sub(1)
}

fn literal_segments(name: &str) -> Vec<NameSegment> {
    name.split('/').map(|segment| NameSegment::Literal(segment.to_string())).collect()
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.display_name())
    }
}

/// One resource of a deployment template.
///
/// `kind` and `api_version` are fixed at construction and only readable
/// afterwards. Everything else is filled in through the consuming `with_*`
/// methods, which is how the builders in [`super::builders`] compose their
/// output.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescription {
    kind: String,
    api_version: String,
    name: TemplateValue,
    location: Option<TemplateValue>,
    properties: BTreeMap<String, TemplateValue>,
    depends_on: Vec<ResourceRef>,
    sku: Option<TemplateValue>,
    tags: BTreeMap<String, TemplateValue>,
}

impl ResourceDescription {
    /// Create a description for a kind listed in the API version table.
    ///
    /// The location defaults to `[resourceGroup().location]`.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::UnknownResourceKind`] if the kind has no registered
    /// API version.
    pub fn new(kind: &str, name: impl Into<TemplateValue>) -> Result<Self, ArmError> {
        let api_version = api_version_for(kind).ok_or_else(|| ArmError::UnknownResourceKind {
            kind: kind.to_string(),
        })?;
        Self::with_api_version(kind, api_version, name)
    }

    /// Create a description with an explicit API version, for kinds outside the table.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::Validation`] if the kind, API version or name is malformed.
    pub fn with_api_version(
        kind: &str,
        api_version: &str,
        name: impl Into<TemplateValue>,
    ) -> Result<Self, ArmError> {
        validate_kind(kind)?;
        validate_api_version(api_version)?;
        let name = name.into();
        match &name {
            TemplateValue::String(s) if s.is_empty() => {
                return Err(ArmError::validation("name", "must not be empty"));
            }
            TemplateValue::String(_) | TemplateValue::Expression(_) => {}
            _ => {
                return Err(ArmError::validation("name", "must be a string or an expression"));
            }
        }

        Ok(Self {
            kind: kind.to_string(),
            api_version: api_version.to_string(),
            name,
            location: Some(TemplateExpression::resource_group_location().into()),
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
            sku: None,
            tags: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<TemplateValue>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<TemplateValue>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a dependency edge. Adding the same reference twice keeps one entry.
    #[must_use]
    pub fn depends_on(mut self, reference: ResourceRef) -> Self {
        if !self.depends_on.iter().any(|r| r.normalized() == reference.normalized()) {
            self.depends_on.push(reference);
        }
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn name(&self) -> &TemplateValue {
        &self.name
    }

    pub fn location(&self) -> Option<&TemplateValue> {
        self.location.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, TemplateValue> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&TemplateValue> {
        self.properties.get(key)
    }

    pub fn dependencies(&self) -> &[ResourceRef] {
        &self.depends_on
    }

    pub fn sku(&self) -> Option<&TemplateValue> {
        self.sku.as_ref()
    }

    pub fn tags(&self) -> &BTreeMap<String, TemplateValue> {
        &self.tags
    }

    /// The reference other resources use to depend on this one.
    #[must_use]
    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind.clone(), self.name.clone())
    }

    /// Visit every expression in the name, location, `dependsOn`, properties,
    /// SKU and tags.
    pub fn for_each_expression<F: FnMut(&TemplateExpression)>(&self, f: &mut F) {
        self.name.for_each_expression(f);
        if let Some(location) = &self.location {
            location.for_each_expression(f);
        }
        for reference in &self.depends_on {
            f(&reference.to_expression());
        }
        self.properties.values().for_each(|value| value.for_each_expression(f));
        if let Some(sku) = &self.sku {
            sku.for_each_expression(f);
        }
        self.tags.values().for_each(|value| value.for_each_expression(f));
    }

    /// Interpret one element of a template's `resources` array.
    ///
    /// `dependsOn` entries must be `[resourceId(...)]` expressions naming the
    /// kind and name of a sibling resource; keys this crate does not model are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::InvalidTemplate`] when a required field is missing or
    /// has the wrong shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ArmError> {
        let serde_json::Value::Object(mut map) = value else {
            return Err(invalid("each resource must be a JSON object"));
        };

        let kind = take_string(&mut map, "type")?;
        let api_version = take_string(&mut map, "apiVersion")?;
        let name = map
            .remove("name")
            .map(TemplateValue::from_json)
            .ok_or_else(|| invalid(format!("resource of type '{kind}' has no name")))?;

        let mut resource =
            Self::with_api_version(&kind, &api_version, name).map_err(|e| invalid(e.to_string()))?;
        resource.location = map.remove("location").map(TemplateValue::from_json);

        if let Some(depends_on) = map.remove("dependsOn") {
            let serde_json::Value::Array(entries) = depends_on else {
                return Err(invalid(format!("dependsOn of '{kind}' must be an array")));
            };
            for entry in entries {
                let reference = parse_dependency(&entry).ok_or_else(|| {
                    invalid(format!(
                        "dependsOn entry {entry} of '{kind}' is not a resourceId(...) expression"
                    ))
                })?;
                resource = resource.depends_on(reference);
            }
        }

        match map.remove("properties") {
            Some(serde_json::Value::Object(properties)) => {
                resource.properties = properties
                    .into_iter()
                    .map(|(k, v)| (k, TemplateValue::from_json(v)))
                    .collect();
            }
            Some(serde_json::Value::Null) | None => {}
            Some(_) => return Err(invalid(format!("properties of '{kind}' must be an object"))),
        }

        resource.sku = map.remove("sku").map(TemplateValue::from_json);

        match map.remove("tags") {
            Some(serde_json::Value::Object(tags)) => {
                resource.tags =
                    tags.into_iter().map(|(k, v)| (k, TemplateValue::from_json(v))).collect();
            }
            Some(serde_json::Value::Null) | None => {}
            Some(_) => return Err(invalid(format!("tags of '{kind}' must be an object"))),
        }

        if !map.is_empty() {
            tracing::debug!(
                kind = %kind,
                ignored = ?map.keys().collect::<Vec<_>>(),
                "Skipping unmodelled resource fields"
            );
        }

        Ok(resource)
    }
}

impl Serialize for ResourceDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResourceDescription", 8)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("apiVersion", &self.api_version)?;
        match &self.location {
            Some(location) => state.serialize_field("location", location)?,
            None => state.skip_field("location")?,
        }
        if self.depends_on.is_empty() {
            state.skip_field("dependsOn")?;
        } else {
            let rendered: Vec<String> =
                self.depends_on.iter().map(|r| r.to_expression().render()).collect();
            state.serialize_field("dependsOn", &rendered)?;
        }
        state.serialize_field("properties", &self.properties)?;
        match &self.sku {
            Some(sku) => state.serialize_field("sku", sku)?,
            None => state.skip_field("sku")?,
        }
        if self.tags.is_empty() {
            state.skip_field("tags")?;
        } else {
            state.serialize_field("tags", &self.tags)?;
        }
        state.end()
    }
}

fn invalid(reason: impl Into<String>) -> ArmError {
    ArmError::InvalidTemplate {
        reason: reason.into(),
    }
}

fn take_string(
    map: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<String, ArmError> {
    match map.remove(key) {
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(other) => Err(invalid(format!("'{key}' must be a string, found {other}"))),
        None => Err(invalid(format!("resource is missing '{key}'"))),
    }
}

fn parse_dependency(entry: &serde_json::Value) -> Option<ResourceRef> {
    let text = entry.as_str()?;
    let TemplateValue::Expression(expression) = TemplateValue::parse_str(text) else {
        return None;
    };
    let (kind, segments) = expression.parse_resource_id_segments()?;
    Some(ResourceRef::from_segments(kind, segments))
}
