//! # docrag-llm
//!
//! Chat completion contract and the HTTP client behind it.
//!
//! - [`provider`]: [`ProviderError`], [`CompletionRequest`] and the
//!   [`CompletionProvider`] trait
//! - [`openai`]: [`OpenAIClient`], which talks to `OpenAI` or Azure `OpenAI`
//!   and implements both [`CompletionProvider`] and
//!   [`docrag_embeddings::EmbeddingService`]
//!
//! Depends on: docrag-core, docrag-embeddings.

#![deny(unsafe_code)]

pub mod openai;
pub mod provider;

pub use openai::{ApiFlavor, OpenAIClient, OpenAIConfig};
pub use provider::{
    CompletionProvider, CompletionRequest, DEFAULT_CONTEXT_LABEL, DEFAULT_QUESTION_LABEL,
    ProviderError, ProviderResult,
};
