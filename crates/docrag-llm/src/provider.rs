//! # Completion provider contract
//!
//! [`CompletionProvider`] is the seam between the retrieval driver and a
//! chat model. A request carries a system prompt, the retrieved context and
//! the user's question; the provider returns the generated text.

use async_trait::async_trait;
use docrag_core::RetryableError;
use docrag_embeddings::EmbeddingError;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failed (missing or rejected key).
    #[error("Auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Provider returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Provider-specific error code.
        code: Option<String>,
        /// Whether this error can be retried.
        retryable: bool,
    },

    /// A successful response carried no usable content.
    #[error("Empty response: {message}")]
    EmptyResponse {
        /// What was missing.
        message: String,
    },

    /// Request was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// Provider-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| {
                        s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
                    })
            }
            Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Auth { .. }
            | Self::EmptyResponse { .. }
            | Self::Cancelled
            | Self::Json(_)
            | Self::Other { .. } => false,
        }
    }

    /// Extract retry-after delay in milliseconds, if available.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// Error category string for logs and metrics.
    pub fn category(&self) -> &str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) | Self::EmptyResponse { .. } => "parse",
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Api { .. } => "api",
            Self::Cancelled => "cancelled",
            Self::Other { .. } => "unknown",
        }
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }

    fn retry_after_ms(&self) -> Option<u64> {
        ProviderError::retry_after_ms(self)
    }

    fn category(&self) -> &str {
        ProviderError::category(self)
    }
}

impl From<ProviderError> for EmbeddingError {
    fn from(err: ProviderError) -> Self {
        EmbeddingError::Provider {
            retryable: err.is_retryable(),
            retry_after_ms: err.retry_after_ms(),
            message: err.to_string(),
        }
    }
}

/// Default label placed before the retrieved document.
pub const DEFAULT_CONTEXT_LABEL: &str = "Context";
/// Default label placed before the user's question.
pub const DEFAULT_QUESTION_LABEL: &str = "Question";

/// One completion call: system prompt plus a user turn built from the
/// retrieved context and the question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: String,
    /// Retrieved document text.
    pub context: String,
    /// The user's question (or the item to analyze).
    pub question: String,
    /// Label rendered before `context`.
    pub context_label: String,
    /// Label rendered before `question`.
    pub question_label: String,
}

impl CompletionRequest {
    /// Request with the default `Context` / `Question` labels.
    pub fn new(
        system: impl Into<String>,
        context: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            context: context.into(),
            question: question.into(),
            context_label: DEFAULT_CONTEXT_LABEL.to_string(),
            question_label: DEFAULT_QUESTION_LABEL.to_string(),
        }
    }

    /// Replace both labels.
    #[must_use]
    pub fn with_labels(
        mut self,
        context_label: impl Into<String>,
        question_label: impl Into<String>,
    ) -> Self {
        self.context_label = context_label.into();
        self.question_label = question_label.into();
        self
    }

    /// The user message sent to the model.
    pub fn user_message(&self) -> String {
        format!(
            "{}: {}\n\n{}: {}",
            self.context_label, self.context, self.question_label, self.question
        )
    }
}

/// A chat model that answers a [`CompletionRequest`].
///
/// Implementors must be `Send + Sync` for use behind an `Arc`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Current model ID.
    fn model(&self) -> &str;

    /// Generate a response. A single attempt; retries are the caller's job.
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<String>;
}
