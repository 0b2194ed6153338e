// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation engine.

pub mod catalog;
pub mod engine;
pub mod outcome;

pub use catalog::Catalog;
pub use engine::{ReconcileError, Reconciler, ReconcilerConfig, DEFAULT_CALL_TIMEOUT};
pub use outcome::{
    AggregateError, AggregateResult, EntryFailure, EntryOutcome, FailureReason, FailureStage,
    PassSummary, ReconcileOutcome,
};
