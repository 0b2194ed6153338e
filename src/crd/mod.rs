// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource definition model.
//!
//! Defines the definition types the warden generates and the structural
//! schema carried by each version.

pub mod schema;
pub mod types;
pub mod validation;

pub use schema::{AdditionalProperties, Constraints, ScalarKind, SchemaError, SchemaNode};
pub use types::{
    definition_name, DefinitionError, DefinitionNames, DefinitionVersion, ResourceDefinition,
    Scope,
};
pub use validation::{validate_definition_name, ValidationError};
