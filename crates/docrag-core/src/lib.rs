//! # docrag-core
//!
//! Foundation pieces shared by every docrag crate:
//!
//! - [`retry`]: retry configuration, backoff math, and the async retry
//!   executor used around every external provider call
//! - [`logging`]: `tracing` subscriber bootstrap
//! - [`documents`]: the document model and the [`DocumentSource`] seam
//!
//! ## Crate Position
//!
//! Leaf crate (no docrag dependencies).
//! Depended on by: docrag-embeddings, docrag-settings, docrag-llm, docrag-agent.

#![deny(unsafe_code)]

pub mod documents;
pub mod logging;
pub mod retry;

pub use documents::{
    CorpusEntry, Document, DocumentError, DocumentSource, FsDocumentSource, StaticDocumentSource,
};
pub use retry::{RetryConfig, RetryError, RetryableError, with_retry};
