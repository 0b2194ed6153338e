// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tests for configuration loading and validation.

use std::collections::HashMap;
use std::io::Write;

use super::*;
use crate::crd::Scope;
use crate::generator::{SchemaShape, MAX_NESTED_DEPTH};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let config = WardenConfig::default();
    config.validate().expect("defaults validate");
    assert_eq!(config.catalog.catalog().len(), 100);
    assert_eq!(config.schedule.policy(), SchedulePolicy::default());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = WardenConfig::from_toml_str(
        r#"
group = "stable.example.com"

[catalog]
indices = [5, 3, 5, 9]

[template]
kind_prefix = "Gadget"
plural_prefix = "gadgets"
singular_prefix = "gadget"
scope = "Cluster"
versions = ["v1", "v2"]
storage_version = "v2"

[template.shape]
kind = "typed"

[reconcile]
max_concurrency = 3
"#,
    )
    .expect("parses");

    config.validate().expect("valid");
    assert_eq!(config.catalog.catalog().as_slice(), &[3, 5, 9]);
    assert_eq!(config.template.shape, SchemaShape::Typed);
    assert_eq!(config.template.scope, Scope::Cluster);
    assert_eq!(config.reconcile.reconciler_config().max_concurrency, 3);
    assert_eq!(config.schedule, ScheduleConfig::default());
    assert_eq!(config.log, LogConfig::default());
}

#[test]
fn test_unknown_field_rejected() {
    let err = WardenConfig::from_toml_str("[schedule]\nsteady = 5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_env_overrides() {
    let mut config = WardenConfig::default();
    config
        .apply_env_overrides(env(&[
            (GROUP_ENV, "ops.example.org"),
            (STORE_DIR_ENV, "/var/lib/warden"),
            (LOG_JSON_ENV, "true"),
            (MAX_CONCURRENCY_ENV, "12"),
        ]))
        .expect("overrides apply");

    assert_eq!(config.group, "ops.example.org");
    assert_eq!(config.store.dir, PathBuf::from("/var/lib/warden"));
    assert!(config.log.json);
    assert_eq!(config.reconcile.max_concurrency, 12);
}

#[test]
fn test_bad_env_value() {
    let mut config = WardenConfig::default();
    let err = config
        .apply_env_overrides(env(&[(MAX_CONCURRENCY_ENV, "lots")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Env { ref var, .. } if var == MAX_CONCURRENCY_ENV));
}

#[test]
fn test_load_with_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "group = \"files.example.io\"\n[catalog]\nstart = 2\nend = 4").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let config = WardenConfig::load_with(env(&[(CONFIG_ENV, path.as_str())])).expect("loads");
    assert_eq!(config.group, "files.example.io");
    assert_eq!(config.catalog.catalog().as_slice(), &[2, 3, 4]);

    let missing = WardenConfig::load_with(env(&[(CONFIG_ENV, "/nonexistent/warden.toml")]));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));
}

#[test]
fn test_validation_rejects() {
    let cases: [(&str, fn(&mut WardenConfig)); 11] = [
        ("group", |c| c.group = String::new()),
        ("catalog", |c| {
            c.catalog.start = 10;
            c.catalog.end = 2;
        }),
        ("catalog.indices", |c| c.catalog.indices = Some(vec![])),
        ("catalog", |c| {
            c.catalog.start = 1;
            c.catalog.end = 200_000;
        }),
        ("catalog.indices", |c| {
            c.catalog.indices = Some((0..=MAX_CATALOG_SIZE as u32).collect())
        }),
        ("template.shape.depth", |c| {
            c.template.shape = SchemaShape::Nested { depth: MAX_NESTED_DEPTH + 1 }
        }),
        ("reconcile.call_timeout_ms", |c| c.reconcile.call_timeout_ms = 0),
        ("schedule.heal_secs", |c| c.schedule.heal_secs = 0),
        ("schedule.backoff_max_secs", |c| c.schedule.backoff_max_secs = 1),
        ("schedule.backoff_multiplier", |c| c.schedule.backoff_multiplier = 0),
        ("template.storage_version", |c| {
            c.template.storage_version = Some("v9".into())
        }),
    ];

    for (field, mutate) in cases {
        let mut config = WardenConfig::default();
        mutate(&mut config);
        match config.validate() {
            Err(ConfigError::Invalid { field: got, .. }) => assert_eq!(got, field),
            other => panic!("{field}: expected Invalid, got {other:?}"),
        }
    }
}

#[test]
fn test_full_u32_range_rejected_before_building_catalog() {
    let config =
        WardenConfig::from_toml_str("[catalog]\nstart = 0\nend = 4294967295\n").unwrap();
    match config.validate() {
        Err(ConfigError::Invalid { field, reason }) => {
            assert_eq!(field, "catalog");
            assert!(reason.contains("4294967296"), "{reason}");
        }
        other => panic!("expected Invalid, got {other:?}"),
    }

    let mut config = WardenConfig::default();
    config.catalog.start = 1;
    config.catalog.end = MAX_CATALOG_SIZE as u32;
    config.validate().expect("largest allowed range");
}

#[test]
fn test_excessive_nested_depth_rejected() {
    let config =
        WardenConfig::from_toml_str("[template.shape]\nkind = \"nested\"\ndepth = 200000\n")
            .unwrap();
    assert_eq!(config.template.shape, SchemaShape::Nested { depth: 200_000 });
    match config.validate() {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "template.shape.depth"),
        other => panic!("expected Invalid, got {other:?}"),
    }

    let mut config = WardenConfig::default();
    config.template.shape = SchemaShape::Nested { depth: MAX_NESTED_DEPTH };
    config.validate().expect("deepest allowed chain");
}

#[test]
fn test_template_producing_bad_names_rejected() {
    let mut config = WardenConfig::default();
    config.template.plural_prefix = "Widgets".into();
    assert!(matches!(config.validate(), Err(ConfigError::Template(_))));

    let mut config = WardenConfig::default();
    config.group = "Not A Group".into();
    assert!(matches!(config.validate(), Err(ConfigError::Template(_))));
}

#[test]
fn test_toml_round_trip_of_defaults() {
    let config = WardenConfig::default();
    let text = config.to_toml_string().expect("serializes");
    assert_eq!(WardenConfig::from_toml_str(&text).expect("parses"), config);
}
