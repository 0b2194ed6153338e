// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for definition types and validation.

use super::*;
use crate::crd::schema::{Constraints, ScalarKind};
use crate::crd::validation::validate_definition_name;
use serde_json::json;

fn names(plural: &str) -> DefinitionNames {
    DefinitionNames {
        kind: "Widget7".to_string(),
        list_kind: "Widget7List".to_string(),
        plural: plural.to_string(),
        singular: "widget7".to_string(),
        short_names: vec!["wd7".to_string()],
    }
}

fn spec_schema() -> SchemaNode {
    SchemaNode::object().with_property(
        "spec",
        SchemaNode::object().with_required(
            "size",
            SchemaNode::scalar(ScalarKind::Integer, Constraints::bounded(0.0, 9.0)),
        ),
    )
}

fn sample() -> ResourceDefinition {
    ResourceDefinition::new(
        "example.io",
        names("widgets7"),
        Scope::Namespaced,
        vec![DefinitionVersion::new("v1", true, spec_schema())],
    )
}

#[test]
fn test_name_is_derived_from_plural_and_group() {
    let def = sample();
    assert_eq!(def.name, "widgets7.example.io");
    assert!(def.validate().is_ok());
}

#[test]
fn test_serialize_manifest_shape() {
    let value = serde_json::to_value(sample()).unwrap();

    assert_eq!(value["apiVersion"], API_VERSION);
    assert_eq!(value["kind"], KIND);
    assert_eq!(value["metadata"]["name"], "widgets7.example.io");
    assert_eq!(value["spec"]["group"], "example.io");
    assert_eq!(value["spec"]["scope"], "Namespaced");
    assert_eq!(value["spec"]["names"]["listKind"], "Widget7List");
    assert_eq!(value["spec"]["names"]["shortNames"], json!(["wd7"]));
    let version = &value["spec"]["versions"][0];
    assert_eq!(version["storage"], json!(true));
    assert_eq!(version["served"], json!(true));
    assert_eq!(
        version["schema"]["openAPIV3Schema"]["properties"]["spec"]["required"],
        json!(["size"])
    );
}

#[test]
fn test_manifest_decodes_back_to_same_definition() {
    let def = sample();
    let json = def.to_json_pretty().unwrap();
    let decoded: ResourceDefinition = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, def);
}

#[test]
fn test_decode_rejects_wrong_kind() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["kind"] = json!("ConfigMap");
    let err = serde_json::from_value::<ResourceDefinition>(value).unwrap_err();
    assert!(err.to_string().contains("unexpected kind"));
}

#[test]
fn test_decode_rejects_name_mismatch() {
    let mut value = serde_json::to_value(sample()).unwrap();
    value["metadata"]["name"] = json!("gadgets.example.io");
    let err = serde_json::from_value::<ResourceDefinition>(value).unwrap_err();
    assert!(err.to_string().contains("does not match"));
}

#[test]
fn test_storage_version_requires_exactly_one() {
    let mut def = sample();
    def.versions.push(DefinitionVersion::new("v2", true, spec_schema()));
    assert!(def.storage_version().is_none());
    assert_eq!(def.validate(), Err(ValidationError::StorageVersionCount(2)));

    for version in &mut def.versions {
        version.storage = false;
    }
    assert_eq!(def.validate(), Err(ValidationError::StorageVersionCount(0)));

    def.versions[1].storage = true;
    assert_eq!(def.storage_version().map(|v| v.name.as_str()), Some("v2"));
    assert!(def.validate().is_ok());
}

#[test]
fn test_no_versions_rejected() {
    let mut def = sample();
    def.versions.clear();
    assert_eq!(def.validate(), Err(ValidationError::NoVersions));
}

#[test]
fn test_duplicate_versions_rejected() {
    let mut def = sample();
    def.versions.push(DefinitionVersion::new("v1", false, spec_schema()));
    assert_eq!(
        def.validate(),
        Err(ValidationError::DuplicateVersion("v1".to_string()))
    );
}

#[test]
fn test_tampered_name_rejected() {
    let mut def = sample();
    def.name = "widgets8.example.io".to_string();
    assert!(matches!(
        def.validate(),
        Err(ValidationError::NameMismatch { .. })
    ));
}

#[test]
fn test_schema_errors_are_attributed_to_version() {
    let bad = SchemaNode::Object {
        properties: Default::default(),
        required: vec!["missing".to_string()],
        additional_properties: Default::default(),
    };
    let mut def = sample();
    def.versions = vec![DefinitionVersion::new("v1beta1", true, bad)];
    match def.validate() {
        Err(ValidationError::Schema { version, .. }) => assert_eq!(version, "v1beta1"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_invalid_kind_rejected() {
    let mut def = sample();
    def.names.kind = "widget".to_string();
    assert!(matches!(def.validate(), Err(ValidationError::InvalidKind(_))));
}

#[test]
fn test_label_rules() {
    use crate::crd::validation::validate_label;

    assert!(validate_label("widgets-7", "plural").is_ok());
    assert!(validate_label("Widgets", "plural").is_err());
    assert!(validate_label("-widgets", "plural").is_err());
    assert!(validate_label("widgets-", "plural").is_err());
    assert!(matches!(
        validate_label("", "plural"),
        Err(ValidationError::EmptyField(_))
    ));
    assert!(matches!(
        validate_label(&"a".repeat(64), "plural"),
        Err(ValidationError::MaxLengthExceeded { max: 63, .. })
    ));
}

#[test]
fn test_definition_name_rules() {
    assert!(validate_definition_name("widgets7.example.io").is_ok());
    assert!(validate_definition_name("widgets7").is_err());
    assert!(validate_definition_name("../etc/passwd").is_err());
    assert!(validate_definition_name("widgets7..example.io").is_err());
    assert!(validate_definition_name("widgets7.example.io/x").is_err());
}
