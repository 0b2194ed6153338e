// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation pass.
//!
//! For each catalog index: generate, probe, create if missing. Entries run
//! with bounded concurrency and never cancel each other; outcomes are sorted
//! by index before aggregation so the result does not depend on completion
//! order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::catalog::Catalog;
use super::outcome::{
    AggregateError, AggregateResult, EntryOutcome, FailureReason, FailureStage, PassSummary,
    ReconcileOutcome,
};
use crate::crd::ResourceDefinition;
use crate::drift::{DriftDetector, DriftStatus};
use crate::generator::Generator;
use crate::scheduler::{SchedulePolicy, Scheduler};
use crate::store::{with_deadline, CreateOutcome, StoreClient};

/// Default deadline for each store call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Entries in flight at once. Values below 1 are treated as 1.
    pub max_concurrency: usize,
    /// Deadline for every `get` and `create`.
    pub call_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get().max(1),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("pass cancelled after {completed} of {total} definitions")]
    Cancelled { completed: usize, total: usize },
}

/// Drives passes over a catalog against one store.
pub struct Reconciler {
    store: Arc<dyn StoreClient>,
    generator: Generator,
    detector: DriftDetector,
    scheduler: Mutex<Scheduler>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn StoreClient>,
        generator: Generator,
        policy: SchedulePolicy,
        config: ReconcilerConfig,
    ) -> Self {
        let detector = DriftDetector::new(store.clone(), config.call_timeout);
        Self {
            store,
            generator,
            detector,
            scheduler: Mutex::new(Scheduler::new(policy)),
            config,
        }
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Copy of the scheduler state between passes.
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.lock().clone()
    }

    /// Run one full pass.
    pub async fn reconcile(&self, catalog: &Catalog, group: &str) -> AggregateResult {
        let started = Instant::now();
        let never = CancellationToken::new();
        let entries = self.run_entries(catalog, group, &never).await;
        self.finish(entries, started)
    }

    /// Run one pass that stops early when `cancel` fires.
    ///
    /// In-flight entries are dropped on cancellation. Creates already applied
    /// stay applied; the scheduler is not advanced.
    pub async fn reconcile_until(
        &self,
        catalog: &Catalog,
        group: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, ReconcileError> {
        let started = Instant::now();
        let entries = self.run_entries(catalog, group, cancel).await;
        if entries.len() < catalog.len() {
            tracing::info!(
                completed = entries.len(),
                total = catalog.len(),
                "reconcile pass cancelled"
            );
            return Err(ReconcileError::Cancelled {
                completed: entries.len(),
                total: catalog.len(),
            });
        }
        Ok(self.finish(entries, started))
    }

    async fn run_entries(
        &self,
        catalog: &Catalog,
        group: &str,
        cancel: &CancellationToken,
    ) -> Vec<EntryOutcome> {
        if let Err(e) = with_deadline(self.config.call_timeout, self.store.begin_pass()).await {
            tracing::warn!(error = %e, "store housekeeping failed");
        }
        let limit = self.config.max_concurrency.max(1);
        stream::iter(catalog.iter())
            .map(|index| self.reconcile_entry(index, group))
            .buffer_unordered(limit)
            .take_until(cancel.cancelled())
            .collect()
            .await
    }

    async fn reconcile_entry(&self, index: u32, group: &str) -> EntryOutcome {
        let definition = self.generator.generate(index, group);
        let outcome = match self.detector.check(&definition).await {
            DriftStatus::Present => ReconcileOutcome::AlreadyPresent,
            DriftStatus::Missing => self.create(&definition).await,
            DriftStatus::Error { kind, error } => ReconcileOutcome::Failed(FailureReason {
                stage: FailureStage::Probe,
                kind,
                message: error.to_string(),
            }),
        };

        if let ReconcileOutcome::Failed(reason) = &outcome {
            tracing::warn!(index, name = %definition.name, %reason, "definition not reconciled");
        } else {
            tracing::debug!(index, name = %definition.name, outcome = ?outcome, "definition reconciled");
        }

        EntryOutcome {
            index,
            name: definition.name,
            outcome,
        }
    }

    async fn create(&self, definition: &ResourceDefinition) -> ReconcileOutcome {
        match with_deadline(self.config.call_timeout, self.store.create(definition)).await {
            Ok(CreateOutcome::Created) => {
                tracing::info!(name = %definition.name, "recreated missing definition");
                ReconcileOutcome::Created
            }
            Ok(CreateOutcome::AlreadyExists) => {
                tracing::debug!(name = %definition.name, "definition appeared concurrently");
                ReconcileOutcome::AlreadyPresent
            }
            Err(error) => ReconcileOutcome::Failed(FailureReason {
                stage: FailureStage::Create,
                kind: error.fault_kind(),
                message: error.to_string(),
            }),
        }
    }

    fn finish(&self, mut entries: Vec<EntryOutcome>, started: Instant) -> AggregateResult {
        entries.sort_by_key(|e| e.index);
        let summary = PassSummary::tally(&entries);
        let error = AggregateError::from_entries(&entries);

        let schedule = self.scheduler.lock().observe(
            summary.created,
            summary.failed,
            error.as_ref().map(|e| e.to_string()),
        );

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Some(err) = &error {
            tracing::warn!(
                state = %schedule.state,
                failed = summary.failed,
                total = summary.total,
                consecutive = schedule.consecutive_failures,
                next_delay_secs = schedule.delay.as_secs(),
                error = %err,
                "reconcile pass degraded"
            );
        } else {
            tracing::info!(
                state = %schedule.state,
                present = summary.present,
                created = summary.created,
                total = summary.total,
                elapsed_ms,
                next_delay_secs = schedule.delay.as_secs(),
                "reconcile pass complete"
            );
        }

        AggregateResult {
            entries,
            summary,
            state: schedule.state,
            next_delay: schedule.delay,
            error,
            last_error: schedule.last_error,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
