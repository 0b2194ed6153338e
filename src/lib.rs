// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! crd-warden keeps a catalog of resource definitions present in a
//! declarative store.
//!
//! Each pass generates the desired definitions, probes the store, recreates
//! whatever is missing and schedules the next pass from the outcome. The
//! store is an injected [`StoreClient`]; the crate ships a directory-backed
//! adapter and an in-memory one.

pub mod config;
pub mod controller;
pub mod crd;
pub mod drift;
pub mod generator;
pub mod reconciler;
pub mod scheduler;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, WardenConfig};
pub use controller::{Controller, ControllerHandle, PassReport, Trigger};
pub use crd::{ResourceDefinition, SchemaNode};
pub use drift::{DriftDetector, DriftStatus};
pub use generator::{generate, DefinitionTemplate, Generator, SchemaShape};
pub use reconciler::{
    AggregateError, AggregateResult, Catalog, ReconcileError, ReconcileOutcome, Reconciler,
    ReconcilerConfig,
};
pub use scheduler::{PassState, SchedulePolicy, Scheduler};
pub use store::{DirectoryStore, FaultKind, MemoryStore, StoreClient, StoreError};
