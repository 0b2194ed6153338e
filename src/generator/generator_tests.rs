// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for the desired-state generator.

use super::*;
use crate::crd::schema::SchemaNode;

fn template(shape: SchemaShape) -> DefinitionTemplate {
    DefinitionTemplate {
        shape,
        ..Default::default()
    }
}

fn all_shapes() -> Vec<SchemaShape> {
    vec![
        SchemaShape::Flat,
        SchemaShape::Nested { depth: 0 },
        SchemaShape::Nested { depth: 10 },
        SchemaShape::Typed,
    ]
}

#[test]
fn test_naming_contract() {
    let def = generate(7, "example.io");
    assert_eq!(def.name, "widgets7.example.io");
    assert_eq!(def.names.plural, "widgets7");
    assert_eq!(def.names.singular, "widget7");
    assert_eq!(def.names.kind, "Widget7");
    assert_eq!(def.names.list_kind, "Widget7List");
    assert_eq!(def.names.short_names, vec!["wd7".to_string()]);
    assert_eq!(def.group, "example.io");
}

#[test]
fn test_name_for_matches_generated_name() {
    let generator = Generator::new(template(SchemaShape::Typed));
    for index in [1, 42, 100] {
        assert_eq!(
            generator.name_for(index, "apps.example.io"),
            generator.generate(index, "apps.example.io").name
        );
    }
}

#[test]
fn test_generation_is_deterministic() {
    for shape in all_shapes() {
        let generator = Generator::new(template(shape));
        for index in [1, 2, 99] {
            let a = generator.generate(index, "example.io");
            let b = generator.generate(index, "example.io");
            assert_eq!(a, b);
            assert_eq!(
                serde_json::to_vec(&a).unwrap(),
                serde_json::to_vec(&b).unwrap()
            );
        }
    }
}

#[test]
fn test_every_shape_generates_valid_definitions() {
    for shape in all_shapes() {
        let generator = Generator::new(template(shape.clone()));
        for index in 1..=50 {
            let def = generator.generate(index, "example.io");
            assert!(
                def.validate().is_ok(),
                "{:?} index {} failed: {:?}",
                shape,
                index,
                def.validate()
            );
        }
    }
}

#[test]
fn test_flat_shape_has_open_spec() {
    let def = Generator::new(template(SchemaShape::Flat)).generate(1, "example.io");
    let root = def.versions[0].schema();
    assert_eq!(root.property("spec"), Some(&SchemaNode::object()));
    assert_eq!(root.depth(), 2);
}

#[test]
fn test_nested_shape_depth() {
    let def = Generator::new(template(SchemaShape::Nested { depth: 10 })).generate(3, "example.io");
    let root = def.versions[0].schema();
    // root object, ten nested objects (spec is the first), string leaf
    assert_eq!(root.depth(), 12);

    let mut node = root.property("spec").unwrap();
    for level in 1..=10 {
        node = node
            .property(&format!("nestedFieldLevel{}", level))
            .unwrap_or_else(|| panic!("missing level {}", level));
    }
    assert_eq!(node, &SchemaNode::string());
}

#[test]
fn test_nested_depth_zero_is_string_spec() {
    let def = Generator::new(template(SchemaShape::Nested { depth: 0 })).generate(1, "example.io");
    assert_eq!(def.versions[0].schema().property("spec"), Some(&SchemaNode::string()));
}

#[test]
fn test_shape_check_caps_nested_depth() {
    assert!(SchemaShape::Flat.check().is_ok());
    assert!(SchemaShape::Typed.check().is_ok());
    assert!(SchemaShape::Nested { depth: MAX_NESTED_DEPTH }.check().is_ok());
    let err = SchemaShape::Nested { depth: MAX_NESTED_DEPTH + 1 }.check().unwrap_err();
    assert!(err.contains("exceeds"), "{err}");
}

#[test]
fn test_typed_shape_bounds_follow_index() {
    let generator = Generator::new(template(SchemaShape::Typed));
    let value = serde_json::to_value(generator.generate(4, "example.io")).unwrap();
    let spec = &value["spec"]["versions"][0]["schema"]["openAPIV3Schema"]["properties"]["spec"];

    assert_eq!(spec["required"], serde_json::json!(["replicas", "image"]));
    assert_eq!(spec["properties"]["replicas"]["maximum"], serde_json::json!(40.0));
    assert_eq!(spec["properties"]["defaultTier"]["enum"], serde_json::json!(["silver"]));
    assert_eq!(spec["properties"]["endpoint"]["format"], "uri");
}

#[test]
fn test_single_storage_version_by_default() {
    let def = generate(1, "example.io");
    assert_eq!(def.versions.len(), 1);
    assert_eq!(def.storage_version().map(|v| v.name.as_str()), Some("v1alpha1"));
}

#[test]
fn test_configured_storage_version() {
    let generator = Generator::new(DefinitionTemplate {
        versions: vec!["v1alpha1".into(), "v1beta1".into(), "v1".into()],
        storage_version: Some("v1beta1".into()),
        ..Default::default()
    });
    let def = generator.generate(5, "example.io");
    assert_eq!(def.versions.len(), 3);
    assert_eq!(def.storage_version().map(|v| v.name.as_str()), Some("v1beta1"));
    assert!(def.validate().is_ok());
}

#[test]
fn test_unknown_storage_version_falls_back_to_first() {
    let generator = Generator::new(DefinitionTemplate {
        versions: vec!["v1".into(), "v2".into()],
        storage_version: Some("v9".into()),
        ..Default::default()
    });
    let def = generator.generate(1, "example.io");
    assert_eq!(def.storage_version().map(|v| v.name.as_str()), Some("v1"));
}

#[test]
fn test_empty_version_list_falls_back() {
    let generator = Generator::new(DefinitionTemplate {
        versions: vec![],
        ..Default::default()
    });
    let def = generator.generate(1, "example.io");
    assert_eq!(def.versions.len(), 1);
    assert_eq!(def.versions[0].name, FALLBACK_VERSION);
    assert!(def.versions[0].storage);
}

#[test]
fn test_short_names_optional() {
    let generator = Generator::new(DefinitionTemplate {
        short_name_prefix: None,
        ..Default::default()
    });
    assert!(generator.generate(1, "example.io").names.short_names.is_empty());
}
