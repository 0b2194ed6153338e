// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pass scheduler.
//!
//! A small state machine over pass outcomes. It never terminates: every
//! pass, however bad, yields a delay for the next one.

pub mod policy;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use policy::{BackoffPolicy, SchedulePolicy};

/// Classification of a finished pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    /// Every definition was already present.
    Idle,
    /// Something was created and nothing failed.
    Healed,
    /// At least one definition failed.
    Degraded,
}

impl PassState {
    /// Classify from per-pass counts.
    pub fn classify(created: usize, failed: usize) -> Self {
        if failed > 0 {
            PassState::Degraded
        } else if created > 0 {
            PassState::Healed
        } else {
            PassState::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassState::Idle => "idle",
            PassState::Healed => "healed",
            PassState::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the scheduler decided after a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub state: PassState,
    pub delay: Duration,
    /// Degraded passes in a row, including this one.
    pub consecutive_failures: u32,
    /// Most recent error seen, kept after recovery.
    pub last_error: Option<String>,
}

/// Tracks consecutive failures and the last error across passes.
#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: SchedulePolicy,
    consecutive_failures: u32,
    last_error: Option<String>,
}

impl Scheduler {
    pub fn new(policy: SchedulePolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a pass and compute the delay before the next one.
    pub fn observe(&mut self, created: usize, failed: usize, error: Option<String>) -> Schedule {
        let state = PassState::classify(created, failed);
        if error.is_some() {
            self.last_error = error;
        }

        let delay = match state {
            PassState::Idle => {
                self.consecutive_failures = 0;
                self.policy.steady_interval
            }
            PassState::Healed => {
                self.consecutive_failures = 0;
                self.policy.heal_interval
            }
            PassState::Degraded => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.policy.backoff.delay_for(self.consecutive_failures)
            }
        };

        Schedule {
            state,
            delay,
            consecutive_failures: self.consecutive_failures,
            last_error: self.last_error.clone(),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulePolicy::default())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
