// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-entry and per-pass reconciliation outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::PassState;
use crate::store::FaultKind;

/// Which store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Probe,
    Create,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Probe => "probe",
            FailureStage::Create => "create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub stage: FailureStage,
    pub kind: FaultKind,
    pub message: String,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed ({}): {}", self.stage.as_str(), self.kind, self.message)
    }
}

/// Outcome of reconciling one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    AlreadyPresent,
    Created,
    Failed(FailureReason),
}

impl ReconcileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReconcileOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub index: u32,
    pub name: String,
    pub outcome: ReconcileOutcome,
}

/// Counts for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub total: usize,
    pub present: usize,
    pub created: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn tally<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a EntryOutcome>,
    {
        entries.into_iter().fold(Self::default(), |mut s, entry| {
            s.total += 1;
            match entry.outcome {
                ReconcileOutcome::AlreadyPresent => s.present += 1,
                ReconcileOutcome::Created => s.created += 1,
                ReconcileOutcome::Failed(_) => s.failed += 1,
            }
            s
        })
    }
}

/// One failed entry inside an [`AggregateError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    pub index: u32,
    pub name: String,
    pub reason: FailureReason,
}

/// Every failure of a pass, in index order.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} of {total} definitions failed to reconcile: {}", .failures.len(), render_failures(.failures))]
pub struct AggregateError {
    pub total: usize,
    pub failures: Vec<EntryFailure>,
}

fn render_failures(failures: &[EntryFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AggregateError {
    /// `None` when no entry failed.
    pub fn from_entries(entries: &[EntryOutcome]) -> Option<Self> {
        let failures: Vec<EntryFailure> = entries
            .iter()
            .filter_map(|e| match &e.outcome {
                ReconcileOutcome::Failed(reason) => Some(EntryFailure {
                    index: e.index,
                    name: e.name.clone(),
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();
        if failures.is_empty() {
            None
        } else {
            Some(Self {
                total: entries.len(),
                failures,
            })
        }
    }

    /// True when every failure is transient.
    pub fn is_transient(&self) -> bool {
        self.failures.iter().all(|f| f.reason.kind == FaultKind::Transient)
    }
}

/// Result of a full pass over the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    /// Sorted by index.
    pub entries: Vec<EntryOutcome>,
    pub summary: PassSummary,
    pub state: PassState,
    pub next_delay: Duration,
    pub error: Option<AggregateError>,
    /// Most recent error seen by the scheduler, possibly from an earlier pass.
    pub last_error: Option<String>,
}

impl AggregateResult {
    pub fn outcome_for(&self, index: u32) -> Option<&ReconcileOutcome> {
        self.entries
            .binary_search_by_key(&index, |e| e.index)
            .ok()
            .map(|pos| &self.entries[pos].outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.entries.iter().filter(|e| e.outcome.is_failed())
    }

    /// Indices created during this pass.
    pub fn created(&self) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.outcome == ReconcileOutcome::Created)
            .map(|e| e.index)
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.state == PassState::Degraded
    }
}
