//! # docrag-embeddings
//!
//! Embedding store and top-k semantic retrieval.
//!
//! - Cosine similarity with explicit failure on dimension mismatch and
//!   zero-magnitude vectors (never NaN)
//! - Write-once [`EmbeddingStore`] built through [`EmbeddingStoreBuilder`]
//! - Brute-force [`rank`] with descending score order and identifier
//!   tie-breaking
//! - [`EmbeddingService`] seam for the external embedding provider
//!
//! ## Crate Position
//!
//! Depends on: docrag-core.
//! Depended on by: docrag-llm, docrag-agent.

#![deny(unsafe_code)]

pub mod errors;
pub mod normalize;
pub mod rank;
pub mod service;
pub mod store;

pub use errors::{EmbeddingError, Operand, Result};
pub use normalize::{cosine_similarity, dot, l2_norm, l2_normalize};
pub use rank::{ScoredDocument, best_match, rank};
pub use service::{EmbeddingService, MockEmbeddingService};
pub use store::{EmbeddingStore, EmbeddingStoreBuilder};
