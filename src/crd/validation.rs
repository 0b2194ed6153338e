// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Validation functions for resource definitions.
//!
//! Rejects names that are not DNS-safe, broken naming derivations, version
//! lists without a single storage version, and malformed schemas.

use std::collections::HashSet;

use super::schema::SchemaError;
use super::types::{definition_name, ResourceDefinition};

/// Maximum length of a DNS label (plural, singular, version name).
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a DNS subdomain (group, full definition name).
pub const MAX_NAME_LENGTH: usize = 253;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{0}' cannot be empty")]
    EmptyField(String),

    #[error("Field '{field}' exceeds maximum length of {max}")]
    MaxLengthExceeded { field: String, max: usize },

    #[error("Field '{field}' is not a DNS label: {value}")]
    InvalidLabel { field: String, value: String },

    #[error("Field '{field}' is not a DNS subdomain: {value}")]
    InvalidSubdomain { field: String, value: String },

    #[error("Invalid kind '{0}': must start with an uppercase letter and be alphanumeric")]
    InvalidKind(String),

    #[error("Name '{name}' does not match derived name '{expected}'")]
    NameMismatch { name: String, expected: String },

    #[error("Definition has no versions")]
    NoVersions,

    #[error("Expected exactly one storage version, found {0}")]
    StorageVersionCount(usize),

    #[error("Duplicate version '{0}'")]
    DuplicateVersion(String),

    #[error("Version '{version}' schema: {source}")]
    Schema {
        version: String,
        #[source]
        source: SchemaError,
    },
}

/// Validate a DNS-1123 label: lowercase alphanumerics and '-', alphanumeric at both ends.
pub fn validate_label(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if value.len() > MAX_LABEL_LENGTH {
        return Err(ValidationError::MaxLengthExceeded {
            field: field.to_string(),
            max: MAX_LABEL_LENGTH,
        });
    }

    let valid_chars = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !value.chars().all(valid_chars) || !alnum(value.chars().next()) || !alnum(value.chars().last())
    {
        return Err(ValidationError::InvalidLabel {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validate a DNS-1123 subdomain: dot-separated labels.
pub fn validate_subdomain(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::MaxLengthExceeded {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    for label in value.split('.') {
        if validate_label(label, field).is_err() {
            return Err(ValidationError::InvalidSubdomain {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a full definition name (`<plural>.<group>`).
///
/// Used by store adapters before a name reaches a file path or URL.
pub fn validate_definition_name(name: &str) -> Result<(), ValidationError> {
    validate_subdomain(name, "name")?;
    if !name.contains('.') {
        return Err(ValidationError::InvalidSubdomain {
            field: "name".to_string(),
            value: name.to_string(),
        });
    }
    Ok(())
}

fn validate_kind(kind: &str) -> Result<(), ValidationError> {
    let starts_upper = kind.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    if !starts_upper || !kind.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidKind(kind.to_string()));
    }
    Ok(())
}

/// Validate a whole definition.
///
/// # Errors
/// Returns the first violation found.
pub fn validate_definition(def: &ResourceDefinition) -> Result<(), ValidationError> {
    validate_subdomain(&def.group, "group")?;
    validate_label(&def.names.plural, "names.plural")?;
    validate_label(&def.names.singular, "names.singular")?;
    for short in &def.names.short_names {
        validate_label(short, "names.shortNames")?;
    }
    validate_kind(&def.names.kind)?;
    validate_kind(&def.names.list_kind)?;

    let expected = definition_name(&def.names.plural, &def.group);
    if def.name != expected {
        return Err(ValidationError::NameMismatch {
            name: def.name.clone(),
            expected,
        });
    }
    validate_definition_name(&def.name)?;

    if def.versions.is_empty() {
        return Err(ValidationError::NoVersions);
    }
    let storage_count = def.versions.iter().filter(|v| v.storage).count();
    if storage_count != 1 {
        return Err(ValidationError::StorageVersionCount(storage_count));
    }

    let mut seen = HashSet::new();
    for version in &def.versions {
        validate_label(&version.name, "versions.name")?;
        if !seen.insert(version.name.as_str()) {
            return Err(ValidationError::DuplicateVersion(version.name.clone()));
        }
        version
            .schema()
            .validate()
            .map_err(|source| ValidationError::Schema {
                version: version.name.clone(),
                source,
            })?;
    }

    Ok(())
}
