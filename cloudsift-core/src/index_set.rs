//! Sorted sets of point indices

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A sorted, duplicate-free set of indices into a point cloud
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSet {
    indices: Vec<usize>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set for a cloud of `len` points, sorting and deduplicating
    pub fn from_indices(mut indices: Vec<usize>, len: usize) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(Self { indices })
    }

    /// Build from a per-point mask, keeping indices where the mask is set
    pub fn from_mask(mask: &[bool]) -> Self {
        Self {
            indices: mask
                .iter()
                .enumerate()
                .filter_map(|(i, &keep)| keep.then_some(i))
                .collect(),
        }
    }

    /// Every index in `0..len` that is not in this set
    pub fn complement(&self, len: usize) -> Self {
        let mut out = Vec::with_capacity(len.saturating_sub(self.indices.len()));
        let mut taken = self.indices.iter().peekable();
        for i in 0..len {
            if taken.peek() == Some(&&i) {
                taken.next();
            } else {
                out.push(i);
            }
        }
        Self { indices: out }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.indices.iter()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.indices
    }
}

impl AsRef<[usize]> for IndexSet {
    fn as_ref(&self) -> &[usize] {
        &self.indices
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}
