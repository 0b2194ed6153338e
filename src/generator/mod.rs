// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Desired-state generator.
//!
//! Turns a catalog index and a group into the full definition that must
//! exist in the store. Generation is pure: the same template, index and group
//! always yield the same definition, so nothing is cached between passes.

pub mod shape;

use serde::{Deserialize, Serialize};

use crate::crd::{definition_name, DefinitionNames, DefinitionVersion, ResourceDefinition, Scope};

pub use shape::{SchemaShape, MAX_NESTED_DEPTH};

/// Version used when a template lists none.
pub const FALLBACK_VERSION: &str = "v1";

/// Naming and shape template applied to every catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionTemplate {
    /// `kind = "{kind_prefix}{index}"`
    pub kind_prefix: String,
    /// `plural = "{plural_prefix}{index}"`
    pub plural_prefix: String,
    /// `singular = "{singular_prefix}{index}"`
    pub singular_prefix: String,
    /// Adds a short name `"{prefix}{index}"` when set.
    pub short_name_prefix: Option<String>,
    pub scope: Scope,
    /// Served versions, in order.
    pub versions: Vec<String>,
    /// Storage version; the first listed version when unset.
    pub storage_version: Option<String>,
    pub shape: SchemaShape,
}

impl Default for DefinitionTemplate {
    fn default() -> Self {
        Self {
            kind_prefix: "Widget".to_string(),
            plural_prefix: "widgets".to_string(),
            singular_prefix: "widget".to_string(),
            short_name_prefix: Some("wd".to_string()),
            scope: Scope::Namespaced,
            versions: vec!["v1alpha1".to_string()],
            storage_version: None,
            shape: SchemaShape::default(),
        }
    }
}

impl DefinitionTemplate {
    pub fn plural(&self, index: u32) -> String {
        format!("{}{}", self.plural_prefix, index)
    }

    /// Version names with the storage flag resolved.
    ///
    /// Exactly one entry is flagged: the configured storage version when it
    /// is listed, otherwise the first version.
    fn resolved_versions(&self) -> Vec<(&str, bool)> {
        if self.versions.is_empty() {
            return vec![(FALLBACK_VERSION, true)];
        }
        let storage = self
            .storage_version
            .as_deref()
            .filter(|s| self.versions.iter().any(|v| v == s))
            .unwrap_or(self.versions[0].as_str());

        let mut flagged = false;
        self.versions
            .iter()
            .map(|v| {
                let is_storage = !flagged && v == storage;
                flagged |= is_storage;
                (v.as_str(), is_storage)
            })
            .collect()
    }
}

/// Generates desired definitions from a [`DefinitionTemplate`].
#[derive(Debug, Clone, Default)]
pub struct Generator {
    template: DefinitionTemplate,
}

impl Generator {
    pub fn new(template: DefinitionTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &DefinitionTemplate {
        &self.template
    }

    /// Derived name for `index` without building the whole definition.
    pub fn name_for(&self, index: u32, group: &str) -> String {
        definition_name(&self.template.plural(index), group)
    }

    /// Build the definition for `index` in `group`.
    pub fn generate(&self, index: u32, group: &str) -> ResourceDefinition {
        let t = &self.template;
        let kind = format!("{}{}", t.kind_prefix, index);
        let names = DefinitionNames {
            list_kind: format!("{}List", kind),
            kind,
            plural: t.plural(index),
            singular: format!("{}{}", t.singular_prefix, index),
            short_names: t
                .short_name_prefix
                .iter()
                .map(|prefix| format!("{}{}", prefix, index))
                .collect(),
        };

        let schema = t.shape.build(index);
        let versions = t
            .resolved_versions()
            .into_iter()
            .map(|(name, storage)| DefinitionVersion::new(name, storage, schema.clone()))
            .collect();

        ResourceDefinition::new(group, names, t.scope, versions)
    }
}

/// Generate with the default template.
pub fn generate(index: u32, group: &str) -> ResourceDefinition {
    Generator::default().generate(index, group)
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
