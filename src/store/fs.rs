// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Directory-backed store.
//!
//! Each definition is a `<name>.json` manifest under the root directory.
//! Creation writes a temporary file and hard-links it into place: the link
//! fails if the target exists, which makes the create atomic and
//! create-if-absent. A create interrupted mid-write leaves only a temporary
//! file behind, never a partial manifest; those are swept at the start of
//! the next pass.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{CreateOutcome, Lookup, StoreClient, StoreError};
use crate::crd::{validate_definition_name, ResourceDefinition};

/// Manifest file extension.
pub const MANIFEST_EXTENSION: &str = "json";

const TEMP_PREFIX: &str = ".tmp-";

/// Store that keeps one JSON manifest per definition in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (and create if needed) the store directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Manifest path for a definition name.
    ///
    /// # Errors
    /// Rejects names that are not valid definition names, so a name can
    /// never escape the root directory.
    pub fn manifest_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_definition_name(name).map_err(|e| StoreError::Invalid(e.to_string()))?;
        Ok(self.root.join(format!("{}.{}", name, MANIFEST_EXTENSION)))
    }

    /// Remove temporary files left by interrupted creates.
    pub async fn sweep_temporaries(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(TEMP_PREFIX));
            if is_temp {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }

    async fn write_temp(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let temp = self
            .root
            .join(format!("{}{}-{}", TEMP_PREFIX, name, uuid::Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&temp).await?;
        let written: std::io::Result<()> = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(temp)
    }
}

#[async_trait]
impl StoreClient for DirectoryStore {
    async fn get(&self, name: &str) -> Result<Lookup, StoreError> {
        let path = self.manifest_path(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Lookup::NotFound),
            Err(e) => return Err(e.into()),
        };
        let definition: ResourceDefinition = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))?;
        if definition.name != name {
            return Err(StoreError::Malformed(format!(
                "{}: holds '{}'",
                path.display(),
                definition.name
            )));
        }
        Ok(Lookup::Found(Box::new(definition)))
    }

    async fn create(&self, definition: &ResourceDefinition) -> Result<CreateOutcome, StoreError> {
        let path = self.manifest_path(&definition.name)?;
        let bytes = definition
            .to_json_pretty()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let temp = self.write_temp(&definition.name, bytes.as_bytes()).await?;
        let linked = tokio::fs::hard_link(&temp, &path).await;
        let _ = tokio::fs::remove_file(&temp).await;

        match linked {
            Ok(()) => Ok(CreateOutcome::Created),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Passes are serialized, so no create of ours is in flight here.
    async fn begin_pass(&self) -> Result<(), StoreError> {
        let swept = self.sweep_temporaries().await?;
        if swept > 0 {
            tracing::info!(swept, dir = %self.root.display(), "removed interrupted writes");
        }
        Ok(())
    }
}
