// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Store client seam.
//!
//! The reconciler never looks a store up from global state; it is handed an
//! `Arc<dyn StoreClient>` capability. Two adapters ship with the crate:
//! [`MemoryStore`] for tests and demos, [`DirectoryStore`] for a directory of
//! manifests.

pub mod fs;
pub mod memory;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crd::ResourceDefinition;

pub use fs::DirectoryStore;
pub use memory::MemoryStore;

/// Result of a lookup by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Box<ResourceDefinition>),
    NotFound,
}

/// Result of a create call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Another writer got there first. Treated as success by the reconciler.
    AlreadyExists,
}

/// Whether a failure is worth retrying soon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Timeouts, connection and I/O faults.
    Transient,
    /// Invalid definitions, authorization failures, malformed responses.
    Permanent,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Transient => "transient",
            FaultKind::Permanent => "permanent",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store call failures. Not-found and already-exists are not errors; they
/// are reported through [`Lookup`] and [`CreateOutcome`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store call exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("I/O error ({kind:?}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl StoreError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            StoreError::Timeout(_) | StoreError::Connection(_) => FaultKind::Transient,
            StoreError::Io { kind, .. } => match kind {
                std::io::ErrorKind::PermissionDenied => FaultKind::Permanent,
                _ => FaultKind::Transient,
            },
            StoreError::Unauthorized(_) | StoreError::Invalid(_) | StoreError::Malformed(_) => {
                FaultKind::Permanent
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        self.fault_kind() == FaultKind::Transient
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Declarative store holding resource definitions.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch a definition by its full name.
    async fn get(&self, name: &str) -> Result<Lookup, StoreError>;

    /// Create a definition if absent. Never updates an existing object.
    async fn create(&self, definition: &ResourceDefinition) -> Result<CreateOutcome, StoreError>;

    /// Housekeeping run at the start of every pass, before any entry.
    async fn begin_pass(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Run a store call under a deadline; exceeding it is a transient failure.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(deadline)),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
