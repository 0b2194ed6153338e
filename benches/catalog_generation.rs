// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Catalog generation and in-memory pass benchmarks.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use crd_warden::{
    Catalog, DefinitionTemplate, Generator, MemoryStore, Reconciler, ReconcilerConfig,
    SchedulePolicy, SchemaShape,
};

const GROUP: &str = "bench.example.io";

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for (label, shape) in [
        ("flat", SchemaShape::Flat),
        ("nested10", SchemaShape::Nested { depth: 10 }),
        ("typed", SchemaShape::Typed),
    ] {
        let generator = Generator::new(DefinitionTemplate {
            shape,
            ..DefinitionTemplate::default()
        });
        group.bench_function(BenchmarkId::new("definition", label), |b| {
            b.iter(|| generator.generate(black_box(42), GROUP))
        });
        group.bench_function(BenchmarkId::new("manifest_json", label), |b| {
            let def = generator.generate(42, GROUP);
            b.iter(|| def.to_json_pretty())
        });
    }
    group.finish();
}

fn bench_idle_pass(c: &mut Criterion) {
    let catalog = Catalog::range(1, 100);
    let generator = Generator::default();
    let store = Arc::new(MemoryStore::with_definitions(
        catalog.iter().map(|i| generator.generate(i, GROUP)),
    ));
    let reconciler = Reconciler::new(
        store,
        generator,
        SchedulePolicy::default(),
        ReconcilerConfig::default(),
    );

    c.bench_function("idle_pass_100", |b| {
        b.iter(|| tokio_test::block_on(reconciler.reconcile(&catalog, GROUP)))
    });
}

criterion_group!(benches, bench_generate, bench_idle_pass);
criterion_main!(benches);
