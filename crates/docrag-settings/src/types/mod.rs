//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file only needs the keys it changes.

mod provider;
mod retrieval;

pub use provider::*;
pub use retrieval::*;

use docrag_core::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "provider": { "baseUrl": "https://my-resource.openai.azure.com" },
///   "retrieval": { "topK": 3 }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocragSettings {
    /// Embedding and completion endpoint.
    pub provider: ProviderSettings,
    /// Corpus and ranking parameters.
    pub retrieval: RetrievalSettings,
    /// Retry policy for provider calls.
    pub retry: RetryConfig,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// System prompts.
    pub prompts: PromptSettings,
    /// Fraud monitor parameters.
    pub monitor: MonitorSettings,
}

impl DocragSettings {
    /// Reject values that would make every run fail.
    ///
    /// An empty `provider.baseUrl` is reported here rather than at the first
    /// HTTP call.
    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "provider.baseUrl is not set".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(SettingsError::InvalidValue(
                "retrieval.topK must be at least 1".into(),
            ));
        }
        if self.provider.timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "provider.timeoutMs must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(SettingsError::InvalidValue(format!(
                "retry.jitterFactor {} is outside 0.0..=1.0",
                self.retry.jitter_factor
            )));
        }
        for kind in [CorpusKind::Banking, CorpusKind::Fraud] {
            if self.retrieval.corpus(kind).is_empty() {
                return Err(SettingsError::InvalidValue(format!(
                    "retrieval.{kind} corpus is empty"
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: docrag_core::logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

/// Fraud monitor parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Transactions generated in simulation mode.
    pub simulate_count: usize,
    /// Transactions generated in batch mode.
    pub batch_size: usize,
    /// Pause between simulated transactions in milliseconds.
    pub interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            simulate_count: 10,
            batch_size: 5,
            interval_ms: 2_000,
        }
    }
}
