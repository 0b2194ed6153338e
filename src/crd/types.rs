// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource definition types.
//!
//! [`ResourceDefinition`] is the in-memory form used by the generator and the
//! reconciler. On the wire it is a `CustomResourceDefinition` manifest; the
//! conversion is checked so that a decoded manifest always satisfies the
//! naming rule `metadata.name == "{plural}.{group}"`.

use serde::{Deserialize, Serialize};

use super::schema::SchemaNode;
pub use super::validation::{validate_definition, ValidationError};

/// API version written into every manifest.
pub const API_VERSION: &str = "apiextensions.k8s.io/v1";

/// Kind written into every manifest.
pub const KIND: &str = "CustomResourceDefinition";

/// Compose a definition name from its plural and group.
pub fn definition_name(plural: &str, group: &str) -> String {
    format!("{}.{}", plural, group)
}

/// Whether instances live inside a namespace or at cluster level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Namespaced,
    Cluster,
}

/// Names under which the defined resource is served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionNames {
    pub kind: String,
    pub list_kind: String,
    pub plural: String,
    pub singular: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
}

/// Validation block of a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSchema {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: SchemaNode,
}

/// One served version of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionVersion {
    pub name: String,
    pub served: bool,
    /// Exactly one version per definition is the storage version.
    pub storage: bool,
    pub schema: VersionSchema,
}

impl DefinitionVersion {
    pub fn new(name: impl Into<String>, storage: bool, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            served: true,
            storage,
            schema: VersionSchema {
                open_api_v3_schema: schema,
            },
        }
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema.open_api_v3_schema
    }
}

/// A resource-type definition the warden keeps present in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CustomResourceDefinition", try_from = "CustomResourceDefinition")]
pub struct ResourceDefinition {
    pub name: String,
    pub group: String,
    pub names: DefinitionNames,
    pub scope: Scope,
    pub versions: Vec<DefinitionVersion>,
}

impl ResourceDefinition {
    /// Build a definition whose name is derived from `names.plural` and `group`.
    pub fn new(
        group: impl Into<String>,
        names: DefinitionNames,
        scope: Scope,
        versions: Vec<DefinitionVersion>,
    ) -> Self {
        let group = group.into();
        Self {
            name: definition_name(&names.plural, &group),
            group,
            names,
            scope,
            versions,
        }
    }

    /// The version marked `storage`, if exactly one is.
    pub fn storage_version(&self) -> Option<&DefinitionVersion> {
        let mut storage = self.versions.iter().filter(|v| v.storage);
        match (storage.next(), storage.next()) {
            (Some(version), None) => Some(version),
            _ => None,
        }
    }

    /// Validate naming, versions, and every schema.
    ///
    /// # Errors
    /// Returns a `ValidationError` describing the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_definition(self)
    }

    /// Render as a pretty JSON manifest.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Manifest metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

/// Manifest spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSpec {
    pub group: String,
    pub names: DefinitionNames,
    pub scope: Scope,
    pub versions: Vec<DefinitionVersion>,
}

/// Wire form of a [`ResourceDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinition {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DefinitionSpec,
}

impl From<ResourceDefinition> for CustomResourceDefinition {
    fn from(def: ResourceDefinition) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ObjectMeta { name: def.name },
            spec: DefinitionSpec {
                group: def.group,
                names: def.names,
                scope: def.scope,
                versions: def.versions,
            },
        }
    }
}

impl TryFrom<CustomResourceDefinition> for ResourceDefinition {
    type Error = DefinitionError;

    fn try_from(crd: CustomResourceDefinition) -> Result<Self, Self::Error> {
        if crd.api_version != API_VERSION {
            return Err(DefinitionError::UnexpectedApiVersion(crd.api_version));
        }
        if crd.kind != KIND {
            return Err(DefinitionError::UnexpectedKind(crd.kind));
        }
        let expected = definition_name(&crd.spec.names.plural, &crd.spec.group);
        if crd.metadata.name != expected {
            return Err(DefinitionError::NameMismatch {
                name: crd.metadata.name,
                expected,
            });
        }
        Ok(Self {
            name: crd.metadata.name,
            group: crd.spec.group,
            names: crd.spec.names,
            scope: crd.spec.scope,
            versions: crd.spec.versions,
        })
    }
}

/// Errors decoding a manifest into a [`ResourceDefinition`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("unexpected apiVersion '{0}'")]
    UnexpectedApiVersion(String),
    #[error("unexpected kind '{0}'")]
    UnexpectedKind(String),
    #[error("metadata.name '{name}' does not match '{expected}'")]
    NameMismatch { name: String, expected: String },
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
