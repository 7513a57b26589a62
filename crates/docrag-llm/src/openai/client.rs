//! HTTP client for the `OpenAI` and Azure `OpenAI` REST APIs.
//!
//! One client serves both the embedding and the chat-completion contracts.
//! Every request carries the configured timeout; a single call makes a
//! single attempt.

use async_trait::async_trait;
use docrag_embeddings::{EmbeddingError, EmbeddingService};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::provider::{CompletionProvider, CompletionRequest, ProviderError, ProviderResult};

use super::types::{
    ApiFlavor, ChatMessage, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
    OpenAIConfig,
};

/// Embedding and chat client for an OpenAI-compatible endpoint.
pub struct OpenAIClient {
    config: OpenAIConfig,
    client: reqwest::Client,
}

impl OpenAIClient {
    /// Create a client with its own connection pool and the configured timeout.
    pub fn new(config: OpenAIConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        info!(
            flavor = ?config.flavor,
            embedding_model = %config.embedding_model,
            completion_model = %config.completion_model,
            "OpenAI client initialized"
        );
        Ok(Self { config, client })
    }

    /// Create a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: OpenAIConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// The active configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self, model: &str, operation: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match self.config.flavor {
            ApiFlavor::Azure => format!(
                "{base}/openai/deployments/{model}/{operation}?api-version={}",
                self.config.api_version
            ),
            ApiFlavor::OpenAi => format!("{base}/v1/{operation}"),
        }
    }

    /// Embeddings URL for the configured model.
    pub fn embeddings_url(&self) -> String {
        self.endpoint(&self.config.embedding_model, "embeddings")
    }

    /// Chat completions URL for the configured model.
    pub fn chat_url(&self) -> String {
        self.endpoint(&self.config.completion_model, "chat/completions")
    }

    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let invalid_key = |e: reqwest::header::InvalidHeaderValue| ProviderError::Auth {
            message: format!("Invalid API key header: {e}"),
        };
        match self.config.flavor {
            ApiFlavor::Azure => {
                let value = HeaderValue::from_str(&self.config.api_key).map_err(invalid_key)?;
                let _ = headers.insert("api-key", value);
            }
            ApiFlavor::OpenAi => {
                let value = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                    .map_err(invalid_key)?;
                let _ = headers.insert(AUTHORIZATION, value);
            }
        }
        Ok(headers)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::Auth {
                message: "API key is empty".into(),
            });
        }
        let headers = self.build_headers()?;
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(docrag_core::retry::parse_retry_after_header);
            let body_text = response.text().await.unwrap_or_default();
            let err = map_status_error(status.as_u16(), &body_text, retry_after);
            error!(
                status = status.as_u16(),
                retryable = err.is_retryable(),
                error = %err,
                "OpenAI API error"
            );
            return Err(err);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Embed `texts`, returning vectors in input order.
    #[instrument(skip_all, fields(model = %self.config.embedding_model, count = texts.len()))]
    pub async fn embed_texts(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };
        debug!("sending embeddings request");
        let response: EmbeddingResponse = self.post_json(&self.embeddings_url(), &request).await?;
        order_embeddings(response, texts.len())
    }

    /// Run one chat completion.
    #[instrument(skip_all, fields(model = %self.config.completion_model))]
    pub async fn chat(&self, request: &CompletionRequest) -> ProviderResult<String> {
        let user = request.user_message();
        let body = ChatRequest {
            model: &self.config.completion_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };
        debug!(user_chars = user.len(), "sending chat request");
        let response: ChatResponse = self.post_json(&self.chat_url(), &body).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::EmptyResponse {
                message: "no message content in first choice".into(),
            })
    }
}

/// Put `data[]` back in input order and check that every input got exactly
/// one vector.
fn order_embeddings(response: EmbeddingResponse, expected: usize) -> ProviderResult<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(ProviderError::EmptyResponse {
            message: format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            ),
        });
    }
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in response.data {
        let slot = slots.get_mut(item.index).ok_or_else(|| ProviderError::Other {
            message: format!("embedding index {} out of range", item.index),
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(ProviderError::Other {
                message: format!("duplicate embedding index {}", item.index),
            });
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| ProviderError::EmptyResponse {
                message: format!("missing embedding for input {i}"),
            })
        })
        .collect()
}

/// Map a non-2xx response to a [`ProviderError`].
fn map_status_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> ProviderError {
    let (message, code) = parse_api_error(body, status);
    match status {
        401 | 403 => ProviderError::Auth { message },
        429 => ProviderError::RateLimited {
            retry_after_ms: retry_after_ms.unwrap_or(0),
            message,
        },
        _ => ProviderError::Api {
            status,
            message,
            code,
            retryable: status == 408 || status >= 500,
        },
    }
}

fn parse_api_error(body: &str, status: u16) -> (String, Option<String>) {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let error = &json["error"];
        let message = error["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        let code = error["code"]
            .as_str()
            .or_else(|| error["type"].as_str())
            .map(String::from);
        (message, code)
    } else {
        (format!("HTTP {status}: {body}"), None)
    }
}

#[async_trait]
impl EmbeddingService for OpenAIClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(self.embed_texts(texts).await?)
    }

    fn model(&self) -> &str {
        &self.config.embedding_model
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    fn model(&self) -> &str {
        &self.config.completion_model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<String> {
        self.chat(request).await
    }
}
