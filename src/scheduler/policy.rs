// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Delay policy for the pass scheduler.

use std::time::Duration;

/// Exponential backoff applied to consecutive degraded passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(300),
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    /// Delay for the `attempt`-th consecutive degraded pass (1-based).
    ///
    /// `initial * multiplier^(attempt - 1)`, capped at `max`. Attempt 0 is
    /// treated as 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Delays emitted for each pass state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// After an `Idle` pass.
    pub steady_interval: Duration,
    /// After a `Healed` pass, to re-verify quickly.
    pub heal_interval: Duration,
    /// After `Degraded` passes.
    pub backoff: BackoffPolicy,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            steady_interval: Duration::from_secs(300),
            heal_interval: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}
