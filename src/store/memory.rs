// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory store with fault injection.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;

use super::{CreateOutcome, Lookup, StoreClient, StoreError};
use crate::crd::ResourceDefinition;

/// Concurrent map of definitions keyed by name.
///
/// Faults are injected per name and stay active until cleared, so a test can
/// model a persistent permission problem or a flapping connection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, ResourceDefinition>,
    get_faults: DashMap<String, StoreError>,
    create_faults: DashMap<String, StoreError>,
    racing_writers: DashSet<String>,
    latency: Mutex<Option<Duration>>,
    create_calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with definitions.
    pub fn with_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = ResourceDefinition>,
    {
        let store = Self::new();
        for def in definitions {
            store.insert(def);
        }
        store
    }

    pub fn insert(&self, definition: ResourceDefinition) {
        self.objects.insert(definition.name.clone(), definition);
    }

    /// Delete a definition, simulating drift.
    pub fn remove(&self, name: &str) -> Option<ResourceDefinition> {
        self.objects.remove(name).map(|(_, def)| def)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn fail_get(&self, name: impl Into<String>, error: StoreError) {
        self.get_faults.insert(name.into(), error);
    }

    pub fn fail_create(&self, name: impl Into<String>, error: StoreError) {
        self.create_faults.insert(name.into(), error);
    }

    /// Make `create(name)` lose a race: another writer stores the object
    /// first and the call reports `AlreadyExists`.
    pub fn race_create(&self, name: impl Into<String>) {
        self.racing_writers.insert(name.into());
    }

    pub fn clear_faults(&self) {
        self.get_faults.clear();
        self.create_faults.clear();
        self.racing_writers.clear();
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Names passed to `create`, in call order.
    pub fn create_calls(&self) -> Vec<String> {
        self.create_calls.lock().clone()
    }

    pub fn reset_create_calls(&self) {
        self.create_calls.lock().clear();
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, name: &str) -> Result<Lookup, StoreError> {
        self.simulate_latency().await;
        if let Some(fault) = self.get_faults.get(name) {
            return Err(fault.value().clone());
        }
        Ok(match self.objects.get(name) {
            Some(def) => Lookup::Found(Box::new(def.value().clone())),
            None => Lookup::NotFound,
        })
    }

    async fn create(&self, definition: &ResourceDefinition) -> Result<CreateOutcome, StoreError> {
        self.create_calls.lock().push(definition.name.clone());
        self.simulate_latency().await;
        if let Some(fault) = self.create_faults.get(&definition.name) {
            return Err(fault.value().clone());
        }
        if self.racing_writers.contains(&definition.name) {
            self.objects
                .entry(definition.name.clone())
                .or_insert_with(|| definition.clone());
            return Ok(CreateOutcome::AlreadyExists);
        }
        Ok(match self.objects.entry(definition.name.clone()) {
            Entry::Occupied(_) => CreateOutcome::AlreadyExists,
            Entry::Vacant(slot) => {
                slot.insert(definition.clone());
                CreateOutcome::Created
            }
        })
    }
}
