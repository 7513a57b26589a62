//! Top-k ranking over an [`EmbeddingStore`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::errors::{EmbeddingError, Result};
use crate::normalize::cosine_similarity;
use crate::store::EmbeddingStore;

/// One ranked document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDocument {
    /// Document identifier.
    pub document_id: String,
    /// Cosine similarity with the query (higher = more similar).
    pub score: f32,
}

/// Descending score; equal scores fall back to ascending identifier.
fn by_score_then_id(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.document_id.cmp(&b.document_id))
}

/// Rank every stored document against `query` and return the best
/// `min(k, store.len())` in non-increasing score order.
///
/// Fails fast with [`EmbeddingError::EmptyStore`] or
/// [`EmbeddingError::InvalidTopK`]. Any failed comparison is returned as
/// [`EmbeddingError::Comparison`] naming the document; no partial ranking is
/// produced. The store is not modified.
pub fn rank(query: &[f32], store: &EmbeddingStore, k: usize) -> Result<Vec<ScoredDocument>> {
    if store.is_empty() {
        return Err(EmbeddingError::EmptyStore);
    }
    if k == 0 {
        return Err(EmbeddingError::InvalidTopK);
    }

    let mut results = store
        .iter()
        .map(|(id, vector)| {
            cosine_similarity(query, vector)
                .map(|score| ScoredDocument {
                    document_id: id.to_string(),
                    score,
                })
                .map_err(|e| EmbeddingError::Comparison {
                    document_id: id.to_string(),
                    source: Box::new(e),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(by_score_then_id);
    results.truncate(k);
    Ok(results)
}

/// The single best match (`k = 1`).
pub fn best_match(query: &[f32], store: &EmbeddingStore) -> Result<ScoredDocument> {
    rank(query, store, 1)?
        .into_iter()
        .next()
        .ok_or(EmbeddingError::EmptyStore)
}
