// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drift detection.
//!
//! Existence is the only drift this crate knows about: a definition that is
//! present counts as converged whatever its content.

use std::sync::Arc;
use std::time::Duration;

use crate::crd::ResourceDefinition;
use crate::store::{with_deadline, FaultKind, Lookup, StoreClient, StoreError};

/// Classification of one desired definition against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum DriftStatus {
    Present,
    Missing,
    Error { kind: FaultKind, error: StoreError },
}

impl DriftStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, DriftStatus::Missing)
    }
}

/// Probes the store for desired definitions.
#[derive(Clone)]
pub struct DriftDetector {
    store: Arc<dyn StoreClient>,
    deadline: Duration,
}

impl DriftDetector {
    pub fn new(store: Arc<dyn StoreClient>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Look the definition up by its derived name and classify the result.
    pub async fn check(&self, definition: &ResourceDefinition) -> DriftStatus {
        let status = match with_deadline(self.deadline, self.store.get(&definition.name)).await {
            Ok(Lookup::Found(_)) => DriftStatus::Present,
            Ok(Lookup::NotFound) => DriftStatus::Missing,
            Err(error) => DriftStatus::Error {
                kind: error.fault_kind(),
                error,
            },
        };
        tracing::debug!(name = %definition.name, status = ?status, "drift check");
        status
    }
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod tests;
