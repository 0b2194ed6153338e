// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Serializable record of one finished pass.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconciler::{AggregateResult, EntryFailure, PassSummary, ReconcileOutcome};
use crate::scheduler::PassState;
use crate::telemetry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub host: String,
    pub group: String,
    pub state: PassState,
    pub summary: PassSummary,
    /// Names created during the pass, in index order.
    pub created: Vec<String>,
    pub failures: Vec<EntryFailure>,
    pub next_delay_ms: u64,
    pub error: Option<String>,
    pub last_error: Option<String>,
}

impl PassReport {
    pub fn new(
        result: &AggregateResult,
        group: &str,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            pass_id: Uuid::new_v4(),
            started_at,
            duration_ms: saturating_millis(duration),
            host: host_name(),
            group: group.to_string(),
            state: result.state,
            summary: result.summary,
            created: result
                .entries
                .iter()
                .filter(|e| e.outcome == ReconcileOutcome::Created)
                .map(|e| e.name.clone())
                .collect(),
            failures: result
                .error
                .as_ref()
                .map(|e| e.failures.clone())
                .unwrap_or_default(),
            next_delay_ms: saturating_millis(result.next_delay),
            error: result.error.as_ref().map(|e| e.to_string()),
            last_error: result.last_error.clone(),
        }
    }

    pub fn next_delay(&self) -> Duration {
        Duration::from_millis(self.next_delay_ms)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Emit pass counters, duration and next delay through the metrics facade.
    pub fn record_metrics(&self) {
        metrics::counter!(telemetry::PASSES_TOTAL, "state" => self.state.as_str()).increment(1);
        metrics::counter!(telemetry::DEFINITIONS_CREATED_TOTAL)
            .increment(self.summary.created as u64);
        metrics::counter!(telemetry::DEFINITIONS_FAILED_TOTAL)
            .increment(self.summary.failed as u64);
        metrics::histogram!(telemetry::PASS_DURATION_MS).record(self.duration_ms as f64);
        metrics::gauge!(telemetry::NEXT_DELAY_SECONDS).set(self.next_delay().as_secs_f64());
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Local host name, or `"unknown"`.
pub fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
