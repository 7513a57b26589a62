//! Model provider settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Which flavor of the OpenAI-compatible API to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Azure OpenAI: deployment-scoped URLs, `api-key` header.
    #[default]
    Azure,
    /// api.openai.com style: `/v1/...` URLs, bearer token.
    #[serde(rename = "openai")]
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Azure => write!(f, "azure"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            other => Err(SettingsError::InvalidValue(format!(
                "unknown provider '{other}' (expected azure or openai)"
            ))),
        }
    }
}

/// Endpoint, credentials lookup and model names for the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// API flavor.
    pub kind: ProviderKind,
    /// Endpoint base URL, without a trailing path.
    pub base_url: String,
    /// `api-version` query parameter (Azure only).
    pub api_version: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Embedding model (Azure: deployment name).
    pub embedding_model: String,
    /// Chat completion model (Azure: deployment name).
    pub completion_model: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Azure,
            base_url: String::new(),
            api_version: "2024-12-01-preview".to_string(),
            api_key_env: "API_KEY".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            completion_model: "gpt-4o-mini".to_string(),
            timeout_ms: 30_000,
        }
    }
}
