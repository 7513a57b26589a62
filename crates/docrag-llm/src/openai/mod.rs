//! `OpenAI` / Azure `OpenAI` client.

mod client;
mod types;

pub use client::OpenAIClient;
pub use types::{
    ApiFlavor, DEFAULT_AZURE_API_VERSION, DEFAULT_COMPLETION_MODEL, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_TIMEOUT, OpenAIConfig,
};
