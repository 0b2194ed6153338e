// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Structural validation schema for resource definitions.
//!
//! A schema is a recursive tree of [`SchemaNode`] values. On the wire each
//! node is an OpenAPI v3 object (`{"type": "object", "properties": ...}`);
//! in memory it is a tagged variant so that constraints only exist where
//! they make sense.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scalar value types supported by the schema model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(ScalarKind::String),
            "integer" => Some(ScalarKind::Integer),
            "number" => Some(ScalarKind::Number),
            "boolean" => Some(ScalarKind::Boolean),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Integer | ScalarKind::Number)
    }

    fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            ScalarKind::String => value.is_string(),
            ScalarKind::Integer => value.is_i64() || value.is_u64(),
            ScalarKind::Number => value.is_number(),
            ScalarKind::Boolean => value.is_boolean(),
        }
    }
}

/// Constraints attached to a scalar node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    /// `Some(vec![])` is a declared-but-empty enum and fails validation.
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub format: Option<String>,
}

impl Constraints {
    pub fn bounded(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum: Some(minimum),
            maximum: Some(maximum),
            ..Default::default()
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Default::default()
        }
    }

    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..Default::default()
        }
    }

    /// True when no constraint is set.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

/// Policy for fields not declared in an object's `properties`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalProperties {
    /// Store default: undeclared fields are pruned.
    #[default]
    Default,
    /// `x-kubernetes-preserve-unknown-fields: true`
    Preserve,
    /// `additionalProperties: false`
    Forbid,
}

/// One node of a structural schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        properties: BTreeMap<String, SchemaNode>,
        required: Vec<String>,
        additional_properties: AdditionalProperties,
    },
    Array {
        items: Box<SchemaNode>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    Scalar {
        kind: ScalarKind,
        constraints: Constraints,
    },
}

impl SchemaNode {
    /// An object with no declared properties.
    pub fn object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: AdditionalProperties::Default,
        }
    }

    /// An object that keeps any field it is given.
    pub fn open_object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: AdditionalProperties::Preserve,
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn scalar(kind: ScalarKind, constraints: Constraints) -> Self {
        SchemaNode::Scalar { kind, constraints }
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String, Constraints::default())
    }

    pub fn integer() -> Self {
        Self::scalar(ScalarKind::Integer, Constraints::default())
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean, Constraints::default())
    }

    /// Add an optional property. No-op on non-object nodes.
    pub fn with_property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let SchemaNode::Object { properties, .. } = &mut self {
            properties.insert(name.into(), node);
        }
        self
    }

    /// Add a property and list it as required in the same step, so the
    /// `required ⊆ properties` invariant holds by construction.
    pub fn with_required(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let SchemaNode::Object {
            properties,
            required,
            ..
        } = &mut self
        {
            let name = name.into();
            if !required.contains(&name) {
                required.push(name.clone());
            }
            properties.insert(name, node);
        }
        self
    }

    pub fn with_additional_properties(mut self, policy: AdditionalProperties) -> Self {
        if let SchemaNode::Object {
            additional_properties,
            ..
        } = &mut self
        {
            *additional_properties = policy;
        }
        self
    }

    pub fn with_item_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        if let SchemaNode::Array {
            min_items,
            max_items,
            ..
        } = &mut self
        {
            *min_items = min;
            *max_items = max;
        }
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::Object { .. } => "object",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Scalar { kind, .. } => kind.as_str(),
        }
    }

    /// Depth of the tree; a lone scalar has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            SchemaNode::Object { properties, .. } => {
                1 + properties.values().map(SchemaNode::depth).max().unwrap_or(0)
            }
            SchemaNode::Array { items, .. } => 1 + items.depth(),
            SchemaNode::Scalar { .. } => 1,
        }
    }

    /// Look up a direct property of an object node.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object { properties, .. } => properties.get(name),
            _ => None,
        }
    }

    /// Check the well-formedness rules recursively.
    ///
    /// # Errors
    /// Returns the first violation found, with the JSON path of the node.
    pub fn validate(&self) -> Result<(), SchemaError> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> Result<(), SchemaError> {
        match self {
            SchemaNode::Object {
                properties,
                required,
                ..
            } => {
                for name in required {
                    if !properties.contains_key(name) {
                        return Err(SchemaError::UndeclaredRequired {
                            path: path.to_string(),
                            field: name.clone(),
                        });
                    }
                }
                for (name, child) in properties {
                    child.validate_at(&format!("{}.{}", path, name))?;
                }
                Ok(())
            }
            SchemaNode::Array {
                items,
                min_items,
                max_items,
            } => {
                check_order(path, "items", *min_items, *max_items)?;
                items.validate_at(&format!("{}[]", path))
            }
            SchemaNode::Scalar { kind, constraints } => {
                validate_scalar(path, *kind, constraints)
            }
        }
    }
}

fn check_order<T: PartialOrd + Copy + std::fmt::Display>(
    path: &str,
    what: &'static str,
    low: Option<T>,
    high: Option<T>,
) -> Result<(), SchemaError> {
    if let (Some(low), Some(high)) = (low, high) {
        if low > high {
            return Err(SchemaError::InvertedBounds {
                path: path.to_string(),
                what,
                low: low.to_string(),
                high: high.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_scalar(path: &str, kind: ScalarKind, c: &Constraints) -> Result<(), SchemaError> {
    if !kind.is_numeric() && (c.minimum.is_some() || c.maximum.is_some()) {
        return Err(SchemaError::InapplicableConstraint {
            path: path.to_string(),
            constraint: "minimum/maximum",
            kind: kind.as_str(),
        });
    }
    if kind != ScalarKind::String
        && (c.min_length.is_some() || c.max_length.is_some() || c.pattern.is_some())
    {
        return Err(SchemaError::InapplicableConstraint {
            path: path.to_string(),
            constraint: "length/pattern",
            kind: kind.as_str(),
        });
    }
    if let Some(value) = c.minimum.iter().chain(c.maximum.iter()).find(|v| !v.is_finite()) {
        return Err(SchemaError::NonFiniteBound {
            path: path.to_string(),
            value: *value,
        });
    }
    check_order(path, "value", c.minimum, c.maximum)?;
    check_order(path, "length", c.min_length, c.max_length)?;

    if let Some(pattern) = &c.pattern {
        regex::Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    }

    if let Some(values) = &c.enum_values {
        if values.is_empty() {
            return Err(SchemaError::EmptyEnum(path.to_string()));
        }
        if let Some(bad) = values.iter().find(|v| !kind.accepts(v)) {
            return Err(SchemaError::EnumTypeMismatch {
                path: path.to_string(),
                kind: kind.as_str(),
                value: bad.to_string(),
            });
        }
    }
    Ok(())
}

/// Well-formedness violations in a schema tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{path}: required field '{field}' is not a declared property")]
    UndeclaredRequired { path: String, field: String },

    #[error("{path}: {what} lower bound {low} exceeds upper bound {high}")]
    InvertedBounds {
        path: String,
        what: &'static str,
        low: String,
        high: String,
    },

    #[error("{path}: bound {value} is not finite")]
    NonFiniteBound { path: String, value: f64 },

    #[error("{path}: {constraint} does not apply to {kind}")]
    InapplicableConstraint {
        path: String,
        constraint: &'static str,
        kind: &'static str,
    },

    #[error("{path}: invalid pattern: {reason}")]
    InvalidPattern { path: String, reason: String },

    #[error("{0}: enum is declared but empty")]
    EmptyEnum(String),

    #[error("{path}: enum value {value} is not a {kind}")]
    EnumTypeMismatch {
        path: String,
        kind: &'static str,
        value: String,
    },

    #[error("unsupported schema type '{0}'")]
    UnsupportedType(String),

    #[error("array schema is missing 'items'")]
    MissingItems,
}

/// OpenAPI v3 wire form of a [`SchemaNode`], used when decoding.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonSchemaProps {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    properties: BTreeMap<String, SchemaNode>,
    #[serde(default)]
    required: Vec<String>,
    additional_properties: Option<bool>,
    #[serde(rename = "x-kubernetes-preserve-unknown-fields")]
    preserve_unknown_fields: Option<bool>,
    items: Option<Box<SchemaNode>>,
    min_items: Option<u64>,
    max_items: Option<u64>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<String>,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<serde_json::Value>>,
    format: Option<String>,
}

impl TryFrom<JsonSchemaProps> for SchemaNode {
    type Error = SchemaError;

    fn try_from(props: JsonSchemaProps) -> Result<Self, Self::Error> {
        match props.type_name.as_str() {
            "object" => {
                let additional_properties = if props.preserve_unknown_fields == Some(true) {
                    AdditionalProperties::Preserve
                } else if props.additional_properties == Some(false) {
                    AdditionalProperties::Forbid
                } else {
                    AdditionalProperties::Default
                };
                Ok(SchemaNode::Object {
                    properties: props.properties,
                    required: props.required,
                    additional_properties,
                })
            }
            "array" => Ok(SchemaNode::Array {
                items: props.items.ok_or(SchemaError::MissingItems)?,
                min_items: props.min_items,
                max_items: props.max_items,
            }),
            other => {
                let kind = ScalarKind::parse(other)
                    .ok_or_else(|| SchemaError::UnsupportedType(other.to_string()))?;
                Ok(SchemaNode::Scalar {
                    kind,
                    constraints: Constraints {
                        minimum: props.minimum,
                        maximum: props.maximum,
                        min_length: props.min_length,
                        max_length: props.max_length,
                        pattern: props.pattern,
                        enum_values: props.enum_values,
                        format: props.format,
                    },
                })
            }
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_name())?;
        match self {
            SchemaNode::Object {
                properties,
                required,
                additional_properties,
            } => {
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
                if !required.is_empty() {
                    map.serialize_entry("required", required)?;
                }
                match additional_properties {
                    AdditionalProperties::Default => {}
                    AdditionalProperties::Preserve => {
                        map.serialize_entry("x-kubernetes-preserve-unknown-fields", &true)?
                    }
                    AdditionalProperties::Forbid => {
                        map.serialize_entry("additionalProperties", &false)?
                    }
                }
            }
            SchemaNode::Array {
                items,
                min_items,
                max_items,
            } => {
                map.serialize_entry("items", items)?;
                if let Some(min) = min_items {
                    map.serialize_entry("minItems", min)?;
                }
                if let Some(max) = max_items {
                    map.serialize_entry("maxItems", max)?;
                }
            }
            SchemaNode::Scalar { constraints: c, .. } => {
                if let Some(v) = c.minimum {
                    map.serialize_entry("minimum", &v)?;
                }
                if let Some(v) = c.maximum {
                    map.serialize_entry("maximum", &v)?;
                }
                if let Some(v) = c.min_length {
                    map.serialize_entry("minLength", &v)?;
                }
                if let Some(v) = c.max_length {
                    map.serialize_entry("maxLength", &v)?;
                }
                if let Some(v) = &c.pattern {
                    map.serialize_entry("pattern", v)?;
                }
                if let Some(v) = &c.enum_values {
                    map.serialize_entry("enum", v)?;
                }
                if let Some(v) = &c.format {
                    map.serialize_entry("format", v)?;
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let props = JsonSchemaProps::deserialize(deserializer)?;
        SchemaNode::try_from(props).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
