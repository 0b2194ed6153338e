// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pluggable schema shapes for generated definitions.

use serde::{Deserialize, Serialize};

use crate::crd::schema::{AdditionalProperties, Constraints, ScalarKind, SchemaNode};

/// Prefix of the property names along a nested chain.
pub const NESTED_FIELD_PREFIX: &str = "nestedFieldLevel";

/// Tiers offered by the typed shape.
pub const TIERS: [&str; 3] = ["bronze", "silver", "gold"];

/// Deepest nested chain a template may ask for. Each level adds two levels
/// of manifest JSON, and the chain must stay readable by the store decoder.
pub const MAX_NESTED_DEPTH: usize = 32;

/// Shape of the `openAPIV3Schema` attached to every generated version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaShape {
    /// Root object with an open `spec` object.
    Flat,
    /// `spec` is a chain of single-property objects ending in a string.
    Nested { depth: usize },
    /// `spec` carries constrained fields; bounds vary with the index.
    Typed,
}

impl Default for SchemaShape {
    fn default() -> Self {
        SchemaShape::Nested { depth: 10 }
    }
}

impl SchemaShape {
    /// Reject shapes whose schemas the stores could not read back.
    pub fn check(&self) -> Result<(), String> {
        match self {
            SchemaShape::Nested { depth } if *depth > MAX_NESTED_DEPTH => Err(format!(
                "nested depth {} exceeds the maximum of {}",
                depth, MAX_NESTED_DEPTH
            )),
            _ => Ok(()),
        }
    }

    /// Build the root schema for catalog entry `index`.
    pub fn build(&self, index: u32) -> SchemaNode {
        let spec = match self {
            SchemaShape::Flat => SchemaNode::object(),
            SchemaShape::Nested { depth } => nested_chain(1, *depth),
            SchemaShape::Typed => typed_spec(index),
        };
        let root = SchemaNode::object().with_property("spec", spec);
        match self {
            SchemaShape::Typed => root.with_property("status", SchemaNode::open_object()),
            _ => root,
        }
    }
}

fn nested_chain(level: usize, max_level: usize) -> SchemaNode {
    if level > max_level {
        return SchemaNode::string();
    }
    SchemaNode::object().with_property(
        format!("{}{}", NESTED_FIELD_PREFIX, level),
        nested_chain(level + 1, max_level),
    )
}

fn typed_spec(index: u32) -> SchemaNode {
    let max_replicas = 10.0 * f64::from(index.max(1));
    let tier = TIERS[index as usize % TIERS.len()];

    SchemaNode::object()
        .with_required(
            "replicas",
            SchemaNode::scalar(ScalarKind::Integer, Constraints::bounded(1.0, max_replicas)),
        )
        .with_required(
            "image",
            SchemaNode::scalar(
                ScalarKind::String,
                Constraints {
                    pattern: Some(r"^[a-z0-9][a-z0-9./_-]*(:[A-Za-z0-9._-]+)?$".to_string()),
                    max_length: Some(255),
                    ..Default::default()
                },
            ),
        )
        .with_property(
            "tier",
            SchemaNode::scalar(
                ScalarKind::String,
                Constraints {
                    enum_values: Some(TIERS.iter().map(|t| (*t).into()).collect()),
                    ..Default::default()
                },
            ),
        )
        .with_property(
            "defaultTier",
            SchemaNode::scalar(ScalarKind::String, Constraints::one_of([tier])),
        )
        .with_property(
            "endpoint",
            SchemaNode::scalar(ScalarKind::String, Constraints::format("uri")),
        )
        .with_property("enabled", SchemaNode::boolean())
        .with_property(
            "ports",
            SchemaNode::array(SchemaNode::scalar(
                ScalarKind::Integer,
                Constraints::bounded(1.0, 65535.0),
            ))
            .with_item_bounds(Some(0), Some(16)),
        )
        .with_property(
            "labels",
            SchemaNode::object().with_additional_properties(AdditionalProperties::Preserve),
        )
}
