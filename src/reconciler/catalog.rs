// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Catalog of definition indices to enforce.

use std::collections::BTreeSet;

/// Ordered, de-duplicated set of catalog indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    indices: Vec<u32>,
}

impl Catalog {
    /// Inclusive range. `start > end` yields an empty catalog.
    pub fn range(start: u32, end: u32) -> Self {
        Self {
            indices: (start..=end).collect(),
        }
    }

    pub fn from_indices<I: IntoIterator<Item = u32>>(indices: I) -> Self {
        indices.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }
}

impl FromIterator<u32> for Catalog {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let set: BTreeSet<u32> = iter.into_iter().collect();
        Self {
            indices: set.into_iter().collect(),
        }
    }
}
