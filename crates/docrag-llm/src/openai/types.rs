//! Configuration and wire types for the OpenAI-compatible endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default `api-version` for Azure OpenAI.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Default embedding model / deployment.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default chat model / deployment.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// URL and auth scheme of the endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApiFlavor {
    /// Azure OpenAI: `/openai/deployments/{model}/...?api-version=`, `api-key` header.
    #[default]
    Azure,
    /// `OpenAI`: `/v1/...`, `Authorization: Bearer`.
    OpenAi,
}

/// Client configuration.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// URL and auth scheme.
    pub flavor: ApiFlavor,
    /// Endpoint base URL (trailing `/` is ignored).
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Azure `api-version` query parameter.
    pub api_version: String,
    /// Embedding model (Azure: deployment name).
    pub embedding_model: String,
    /// Chat model (Azure: deployment name).
    pub completion_model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Config with default models, API version and timeout.
    pub fn new(flavor: ApiFlavor, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            flavor,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("flavor", &self.flavor)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("embedding_model", &self.embedding_model)
            .field("completion_model", &self.completion_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ── Embeddings ──────────────────────────────────────────────────────────────

/// `POST .../embeddings` body.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

/// `POST .../embeddings` response.
#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}

// ── Chat completions ────────────────────────────────────────────────────────

/// `POST .../chat/completions` body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// `POST .../chat/completions` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}
