//! Template values and expressions.
//!
//! ARM templates carry two kinds of strings that look identical on the wire:
//! plain literals and template function calls wrapped in square brackets
//! (`"[resourceGroup().location]"`). This module keeps them apart in memory so a
//! computed reference can never be emitted as a quoted literal, and vice versa.
//!
//! # Escaping
//!
//! A literal string that starts with `[` and ends with `]` would be evaluated by
//! the control plane. Such literals are written with a doubled leading bracket
//! (`"[[not an expression]"`), and parsing applies the inverse rule:
//!
//! ```rust
//! use armgen_cli::template::{TemplateExpression, TemplateValue};
//!
//! let literal = TemplateValue::from("[not an expression]");
//! assert_eq!(serde_json::to_string(&literal).unwrap(), r#""[[not an expression]""#);
//!
//! let expression = TemplateValue::from(TemplateExpression::resource_group_location());
//! assert_eq!(serde_json::to_string(&expression).unwrap(), r#""[resourceGroup().location]""#);
//!
//! assert_eq!(TemplateValue::parse_str("[[not an expression]"), literal);
//! ```

use regex::Regex;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::constants::RESOURCE_GROUP_LOCATION;
use crate::core::ArmError;

static PARAMETER_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"parameters\(\s*'((?:[^']|'')*)'\s*\)").expect("static regex is valid")
});

static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^'((?:[^']|'')*)'$").expect("static regex is valid"));

const RESOURCE_ID_FUNCTION: &str = "resourceId";

/// One name argument of a `resourceId(...)` call.
///
/// Literal segments are quoted when rendered; expression segments are passed
/// through as-is so the control plane evaluates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameSegment {
    Literal(String),
    Expression(TemplateExpression),
}

impl NameSegment {
    /// The segment as a `resourceId` argument.
    #[must_use]
    pub fn to_argument(&self) -> String {
        match self {
            Self::Literal(text) => quote(text),
            Self::Expression(expression) => expression.as_str().to_string(),
        }
    }

    fn from_argument(argument: &str) -> Option<Self> {
        if let Some(caps) = QUOTED_LITERAL.captures(argument) {
            return Some(Self::Literal(unquote(caps.get(1)?.as_str())));
        }
        TemplateExpression::new(argument).ok().map(Self::Expression)
    }
}

impl fmt::Display for NameSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Expression(expression) => write!(f, "{expression}"),
        }
    }
}

/// A template function call, stored without its surrounding brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateExpression(String);

impl TemplateExpression {
    /// Wrap an expression body such as `concat('a', 'b')`.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::Validation`] if the body is empty or still carries the
    /// surrounding brackets.
    pub fn new(expression: impl Into<String>) -> Result<Self, ArmError> {
        let expression = expression.into();
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ArmError::validation("expression", "must not be empty"));
        }
        if trimmed.starts_with('[') {
            return Err(ArmError::validation(
                "expression",
                format!("'{trimmed}' must be given without surrounding brackets"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `resourceGroup().location`
    #[must_use]
    pub fn resource_group_location() -> Self {
        Self(RESOURCE_GROUP_LOCATION.to_string())
    }

    /// `resourceId('<kind>', '<segment>', ...)` for a (possibly nested) resource name.
    ///
    /// Child names such as `vnet-a/peering-vnet-b` are split into one argument per
    /// segment, which is how ARM addresses nested resources.
    #[must_use]
    pub fn resource_id(kind: &str, name: &str) -> Self {
        let segments: Vec<NameSegment> =
            name.split('/').map(|segment| NameSegment::Literal(segment.to_string())).collect();
        Self::resource_id_from_segments(kind, &segments)
    }

    /// `resourceId('<kind>', <segment>, ...)` where segments may be expressions.
    #[must_use]
    pub fn resource_id_from_segments(kind: &str, segments: &[NameSegment]) -> Self {
        let mut call = format!("{RESOURCE_ID_FUNCTION}({}", quote(kind));
        for segment in segments {
            call.push_str(", ");
            call.push_str(&segment.to_argument());
        }
        call.push(')');
        Self(call)
    }

    /// `split(<self>, '/')[<index>]`, one segment of a nested name held in an expression.
    #[must_use]
    pub fn name_segment(&self, index: usize) -> Self {
        Self(format!("split({}, '/')[{index}]", self.0))
    }

    /// `parameters('<name>')`
    #[must_use]
    pub fn parameter(name: &str) -> Self {
        Self(format!("parameters({})", quote(name)))
    }

    /// The expression body without brackets.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The expression as it appears in template JSON, including brackets.
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}]", self.0)
    }

    /// Names of all template parameters referenced through `parameters('...')`.
    #[must_use]
    pub fn parameter_references(&self) -> Vec<String> {
        PARAMETER_REFERENCE
            .captures_iter(&self.0)
            .filter_map(|caps| caps.get(1))
            .map(|m| unquote(m.as_str()))
            .collect()
    }

    /// Decompose a `resourceId('<kind>', '<segment>', ...)` call with literal
    /// segments into kind and `/`-joined name.
    ///
    /// Returns `None` for any other expression, including calls with expression
    /// segments (see [`TemplateExpression::parse_resource_id_segments`]).
    #[must_use]
    pub fn parse_resource_id(&self) -> Option<(String, String)> {
        let (kind, segments) = self.parse_resource_id_segments()?;
        let names = segments
            .iter()
            .map(|segment| match segment {
                NameSegment::Literal(text) => Some(text.as_str()),
                NameSegment::Expression(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some((kind, names.join("/")))
    }

    /// Decompose a `resourceId('<kind>', <segment>, ...)` call into kind and
    /// name segments, each either a quoted literal or an expression.
    ///
    /// Returns `None` for any other expression, including `resourceId` calls that
    /// take a subscription or resource group argument.
    #[must_use]
    pub fn parse_resource_id_segments(&self) -> Option<(String, Vec<NameSegment>)> {
        let (function, rest) = self.0.split_at_checked(RESOURCE_ID_FUNCTION.len())?;
        if !function.eq_ignore_ascii_case(RESOURCE_ID_FUNCTION) {
            return None;
        }
        let arguments = rest.trim_start().strip_prefix('(')?.strip_suffix(')')?;
        let mut arguments = split_arguments(arguments)?.into_iter();

        let kind = match NameSegment::from_argument(arguments.next()?)? {
            NameSegment::Literal(kind) if kind.contains('/') => kind,
            _ => return None,
        };
        let segments = arguments.map(NameSegment::from_argument).collect::<Option<Vec<_>>>()?;

        // Each nested type level needs exactly one name segment
        let type_levels = kind.split('/').count().saturating_sub(1);
        if segments.is_empty() || segments.len() != type_levels {
            return None;
        }
        Some((kind, segments))
    }
}

impl fmt::Display for TemplateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn unquote(value: &str) -> String {
    value.replace("''", "'")
}

/// Split a function argument list at top-level commas.
///
/// Commas inside quoted strings, parentheses or index brackets do not split.
/// Returns `None` when quotes or brackets are unbalanced.
fn split_arguments(arguments: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;
    for (index, c) in arguments.char_indices() {
        match c {
            // A doubled quote toggles twice and stays inside the literal
            '\'' => in_quote = !in_quote,
            '(' | '[' if !in_quote => depth += 1,
            ')' | ']' if !in_quote => depth = depth.checked_sub(1)?,
            ',' if !in_quote && depth == 0 => {
                parts.push(arguments[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    if in_quote || depth != 0 {
        return None;
    }
    parts.push(arguments[start..].trim());
    Some(parts)
}

/// Escape a literal so the control plane never evaluates it.
fn escape_literal(text: &str) -> Cow<'_, str> {
    if text.starts_with('[') && text.ends_with(']') {
        Cow::Owned(format!("[{text}"))
    } else {
        Cow::Borrowed(text)
    }
}

/// A value inside a resource description: JSON data plus template expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    /// A literal string, escaped on output when it could be mistaken for an expression.
    String(String),
    /// A template function call emitted verbatim inside brackets.
    Expression(TemplateExpression),
    Array(Vec<TemplateValue>),
    Object(BTreeMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Build an object from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<TemplateValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Interpret a JSON string the way the control plane does.
    ///
    /// `"[[...]"` is an escaped literal, `"[...]"` an expression, anything else a
    /// plain literal.
    #[must_use]
    pub fn parse_str(text: &str) -> Self {
        if text.starts_with("[[") && text.ends_with(']') {
            return Self::String(text[1..].to_string());
        }
        if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
            let body = text[1..text.len() - 1].trim();
            if !body.is_empty() {
                return Self::Expression(TemplateExpression(body.to_string()));
            }
        }
        Self::String(text.to_string())
    }

    /// Convert parsed JSON, classifying every string with [`TemplateValue::parse_str`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::parse_str(&s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect())
            }
        }
    }

    /// The value as it is written into the template.
    ///
    /// Literals carry their escaping and expressions their brackets, so the
    /// literal `[x]` shows as `[[x]` and never reads like the expression `x`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::String(s) => escape_literal(s).into_owned(),
            Self::Expression(e) => e.render(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_expression(&self) -> Option<&TemplateExpression> {
        match self {
            Self::Expression(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key when the value is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Visit every expression contained in the value, depth first.
    pub fn for_each_expression<F: FnMut(&TemplateExpression)>(&self, f: &mut F) {
        match self {
            Self::Expression(e) => f(e),
            Self::Array(items) => items.iter().for_each(|item| item.for_each_expression(f)),
            Self::Object(map) => map.values().for_each(|value| value.for_each_expression(f)),
            _ => {}
        }
    }
}

impl Serialize for TemplateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(&escape_literal(s)),
            Self::Expression(e) => serializer.serialize_str(&e.render()),
            Self::Array(items) => items.serialize(serializer),
            Self::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TemplateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from_json)
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<TemplateExpression> for TemplateValue {
    fn from(value: TemplateExpression) -> Self {
        Self::Expression(value)
    }
}

impl From<Vec<TemplateValue>> for TemplateValue {
    fn from(value: Vec<TemplateValue>) -> Self {
        Self::Array(value)
    }
}

impl From<BTreeMap<String, TemplateValue>> for TemplateValue {
    fn from(value: BTreeMap<String, TemplateValue>) -> Self {
        Self::Object(value)
    }
}
