//! Write-once embedding store.
//!
//! [`EmbeddingStoreBuilder`] collects `(identifier, vector)` pairs and fixes
//! the dimensionality from the first vector. [`EmbeddingStoreBuilder::build`]
//! freezes the result into an [`EmbeddingStore`], which has no mutating
//! methods and can be shared across tasks behind an `Arc`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::{EmbeddingError, Result};
use crate::rank::{ScoredDocument, rank};

/// Collects embeddings before the store is frozen.
#[derive(Debug, Default)]
pub struct EmbeddingStoreBuilder {
    vectors: BTreeMap<String, Vec<f32>>,
    dims: Option<usize>,
}

impl EmbeddingStoreBuilder {
    /// Create an empty builder; dimensions are taken from the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder that only accepts vectors of length `dims`.
    pub fn with_dimensions(dims: usize) -> Self {
        Self {
            vectors: BTreeMap::new(),
            dims: Some(dims),
        }
    }

    /// Insert (or replace) the vector for `id`.
    ///
    /// Fails with [`EmbeddingError::DimensionMismatch`] when the vector's
    /// length differs from the store's dimensionality.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let id = id.into();
        match self.dims {
            Some(expected) if expected != vector.len() => {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dims = Some(vector.len()),
        }
        if self.vectors.insert(id.clone(), vector).is_some() {
            debug!(id = %id, "replaced existing embedding");
        }
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<Self> {
        self.insert(id, vector)?;
        Ok(self)
    }

    /// Number of vectors collected so far.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Freeze into a read-only store.
    pub fn build(self) -> EmbeddingStore {
        EmbeddingStore {
            dims: self.dims.unwrap_or(0),
            vectors: self.vectors,
        }
    }
}

/// Read-only mapping from document identifier to embedding vector.
///
/// Iteration is in ascending identifier order, independent of the order in
/// which documents were inserted.
#[derive(Clone, Debug, Default)]
pub struct EmbeddingStore {
    vectors: BTreeMap<String, Vec<f32>>,
    dims: usize,
}

impl EmbeddingStore {
    /// Start building a store.
    pub fn builder() -> EmbeddingStoreBuilder {
        EmbeddingStoreBuilder::new()
    }

    /// Vector dimensionality (0 for an empty store).
    pub fn dimensions(&self) -> usize {
        self.dims
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Look up one vector.
    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    /// Whether `id` is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.vectors.contains_key(id)
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vectors.keys().map(String::as_str)
    }

    /// `(identifier, vector)` pairs in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.vectors
            .iter()
            .map(|(id, v)| (id.as_str(), v.as_slice()))
    }

    /// Rank stored documents against `query`; see [`rank`].
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        rank(query, self, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fixes_dims_from_first_insert() {
        let mut builder = EmbeddingStoreBuilder::new();
        builder.insert("a", vec![1.0, 0.0]).unwrap();
        let err = builder.insert("b", vec![1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn builder_with_dimensions_rejects_first_mismatch() {
        let mut builder = EmbeddingStoreBuilder::with_dimensions(4);
        assert!(builder.insert("a", vec![1.0]).is_err());
        assert!(builder.is_empty());
    }

    #[test]
    fn insert_replaces_existing() {
        let store = EmbeddingStore::builder()
            .with("a", vec![1.0, 0.0])
            .unwrap()
            .with("a", vec![0.0, 1.0])
            .unwrap()
            .build();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn iteration_ignores_insertion_order() {
        let store = EmbeddingStore::builder()
            .with("c", vec![1.0])
            .unwrap()
            .with("a", vec![2.0])
            .unwrap()
            .with("b", vec![3.0])
            .unwrap()
            .build();
        let ids: Vec<&str> = store.ids().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let first = store.iter().next().unwrap();
        assert_eq!(first, ("a", &[2.0][..]));
    }

    #[test]
    fn empty_store() {
        let store = EmbeddingStoreBuilder::new().build();
        assert!(store.is_empty());
        assert_eq!(store.dimensions(), 0);
        assert!(store.get("missing").is_none());
        assert!(!store.contains("missing"));
    }

    #[test]
    fn store_reports_dimensions() {
        let store = EmbeddingStore::builder()
            .with("a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .build();
        assert_eq!(store.dimensions(), 3);
        assert!(store.contains("a"));
    }

    #[test]
    fn rank_method_delegates() {
        let store = EmbeddingStore::builder()
            .with("x", vec![1.0, 0.0])
            .unwrap()
            .with("y", vec![0.0, 1.0])
            .unwrap()
            .build();
        let results = store.rank(&[0.0, 2.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, "y");
    }
}
