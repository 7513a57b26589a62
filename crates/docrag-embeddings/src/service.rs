//! Embedding service trait and mock implementation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::errors::{EmbeddingError, Result};
use crate::normalize::l2_normalize;

/// Trait for embedding text into vectors.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (default: calls `embed` with one item).
    async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Provider {
                message: "empty result".into(),
                retryable: false,
                retry_after_ms: None,
            })
    }

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Mock embedding service for testing.
///
/// Generates deterministic embeddings by hashing input text with SHA-256,
/// using the hash bytes as seeds for the vector components. Texts can be
/// pinned to explicit vectors, and the service can be made to fail a number
/// of calls before succeeding.
pub struct MockEmbeddingService {
    dims: usize,
    ready: AtomicBool,
    pinned: Vec<(String, Vec<f32>)>,
    failures_remaining: AtomicUsize,
    failure_retry_after_ms: Option<u64>,
    calls: AtomicUsize,
}

impl MockEmbeddingService {
    /// Create a new mock service with the given dimensions.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            ready: AtomicBool::new(true),
            pinned: Vec::new(),
            failures_remaining: AtomicUsize::new(0),
            failure_retry_after_ms: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `vector` whenever `text` is embedded.
    #[must_use]
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.pinned.push((text.into(), vector));
        self
    }

    /// Fail the next `n` calls with a retryable provider error.
    #[must_use]
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Simulated failures ask the caller to wait `ms` before retrying.
    #[must_use]
    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.failure_retry_after_ms = Some(ms);
        self
    }

    /// Set whether this mock is ready.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of `embed` calls made so far (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.pinned
            .iter()
            .find(|(t, _)| t == text)
            .map_or_else(|| self.hash_to_vector(text), |(_, v)| v.clone())
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        let mut v: Vec<f32> = (0..self.dims)
            .map(|i| {
                let byte_idx = i % hash.len();
                // Map byte to [-1, 1] range
                (f32::from(hash[byte_idx]) / 127.5) - 1.0
            })
            .collect();

        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.ready.load(Ordering::SeqCst) {
            return Err(EmbeddingError::NotReady);
        }
        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(EmbeddingError::Provider {
                message: "simulated provider failure".into(),
                retryable: true,
                retry_after_ms: self.failure_retry_after_ms,
            });
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model(&self) -> &str {
        "mock"
    }
}
