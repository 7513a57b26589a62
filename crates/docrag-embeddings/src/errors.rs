//! Embedding error types.
//!
//! Data errors (`DimensionMismatch`, `DegenerateVector`, `NonFinite`,
//! `EmptyStore`, `InvalidTopK`) are never retried. `Provider` errors carry
//! their own retryability and any server-requested delay.

use std::fmt;

use docrag_core::RetryableError;
use thiserror::Error;

/// Which argument of a two-vector operation an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// First argument (the query, when ranking).
    Left,
    /// Second argument (the stored document vector, when ranking).
    Right,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors from embedding and ranking operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Two vectors in one operation have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the reference vector.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A vector has zero magnitude, so its direction is undefined.
    #[error("degenerate vector: {operand} operand has zero magnitude")]
    DegenerateVector {
        /// Which argument was degenerate.
        operand: Operand,
    },

    /// A vector has a NaN or infinite component.
    #[error("non-finite vector: {operand} operand contains NaN or infinity")]
    NonFinite {
        /// Which argument was non-finite.
        operand: Operand,
    },

    /// Ranking was requested against a store with no documents.
    #[error("cannot rank against an empty store")]
    EmptyStore,

    /// Ranking was requested with `k == 0`.
    #[error("top-k must be at least 1")]
    InvalidTopK,

    /// Comparing the query with one stored document failed.
    #[error("comparison with document '{document_id}' failed: {source}")]
    Comparison {
        /// The document in the failed pair.
        document_id: String,
        /// The underlying data error.
        #[source]
        source: Box<EmbeddingError>,
    },

    /// The embedding provider call failed.
    #[error("Embedding provider failed: {message}")]
    Provider {
        /// Error description.
        message: String,
        /// Whether retrying may help.
        retryable: bool,
        /// Server-requested delay before retrying, in milliseconds.
        retry_after_ms: Option<u64>,
    },

    /// Service not ready.
    #[error("Embedding service not ready")]
    NotReady,
}

impl EmbeddingError {
    /// Whether retrying the call that produced this error may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { retryable: true, .. })
    }

    /// The innermost data error, looking through `Comparison`.
    pub fn root(&self) -> &EmbeddingError {
        match self {
            Self::Comparison { source, .. } => source.root(),
            other => other,
        }
    }
}

impl RetryableError for EmbeddingError {
    fn is_retryable(&self) -> bool {
        EmbeddingError::is_retryable(self)
    }

    fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Provider { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    fn category(&self) -> &str {
        match self {
            Self::Provider { .. } | Self::NotReady => "embedding_provider",
            _ => "data",
        }
    }
}

/// Result alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
