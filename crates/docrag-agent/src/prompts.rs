//! Prompt templates for each mode.

use docrag_llm::{CompletionRequest, DEFAULT_CONTEXT_LABEL, DEFAULT_QUESTION_LABEL};
use docrag_settings::PromptSettings;

const FRAUD_CONTEXT_LABEL: &str = "Fraud Patterns Context";
const TRANSACTION_LABEL: &str = "Transaction to Analyze";
const FRAUD_QUESTION: &str =
    "Is this transaction suspicious? Which specific fraud pattern does it match (if any)?";

/// How a question and its retrieved context become a [`CompletionRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    system: String,
    context_label: String,
    question_label: String,
    question_suffix: Option<String>,
}

impl PromptTemplate {
    /// Plain `Context` / `Question` prompt.
    pub fn banking(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            context_label: DEFAULT_CONTEXT_LABEL.to_string(),
            question_label: DEFAULT_QUESTION_LABEL.to_string(),
            question_suffix: None,
        }
    }

    /// Fraud-pattern chat; same layout as [`banking`](Self::banking).
    pub fn fraud_expert(system: impl Into<String>) -> Self {
        Self::banking(system)
    }

    /// Transaction analysis: fraud labels plus a fixed closing question.
    pub fn fraud_analysis(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            context_label: FRAUD_CONTEXT_LABEL.to_string(),
            question_label: TRANSACTION_LABEL.to_string(),
            question_suffix: Some(FRAUD_QUESTION.to_string()),
        }
    }

    /// Build the request for `question` with `context` as reference text.
    pub fn request(&self, context: &str, question: &str) -> CompletionRequest {
        let question = match &self.question_suffix {
            Some(suffix) => format!("{question}\n\n{suffix}"),
            None => question.to_string(),
        };
        CompletionRequest::new(self.system.clone(), context, question)
            .with_labels(self.context_label.clone(), self.question_label.clone())
    }
}

/// One template per mode.
#[derive(Clone, Debug)]
pub struct PromptSet {
    /// Used by `ask`.
    pub banking: PromptTemplate,
    /// Used by `chat`.
    pub fraud_expert: PromptTemplate,
    /// Used by `monitor`.
    pub fraud_analysis: PromptTemplate,
}

impl PromptSet {
    /// Templates for all three modes from configured system prompts.
    pub fn from_settings(prompts: &PromptSettings) -> Self {
        Self {
            banking: PromptTemplate::banking(&prompts.banking_system),
            fraud_expert: PromptTemplate::fraud_expert(&prompts.fraud_expert_system),
            fraud_analysis: PromptTemplate::fraud_analysis(&prompts.fraud_analysis_system),
        }
    }
}
