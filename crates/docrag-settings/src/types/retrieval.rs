//! Corpus, retrieval and prompt settings.

use std::fmt;
use std::str::FromStr;

use docrag_core::CorpusEntry;
use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Which built-in corpus to retrieve from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    /// Bank policy, loan terms and FAQ.
    #[default]
    Banking,
    /// Fraud pattern references.
    Fraud,
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Banking => write!(f, "banking"),
            Self::Fraud => write!(f, "fraud"),
        }
    }
}

impl FromStr for CorpusKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "banking" => Ok(Self::Banking),
            "fraud" => Ok(Self::Fraud),
            other => Err(SettingsError::InvalidValue(format!(
                "unknown corpus '{other}' (expected banking or fraud)"
            ))),
        }
    }
}

/// Retrieval parameters and corpus definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Number of matches to rank.
    pub top_k: usize,
    /// Directory that corpus paths are relative to.
    pub documents_dir: String,
    /// Corpus used by `ask`.
    pub corpus: CorpusKind,
    /// Banking corpus entries.
    pub banking: Vec<CorpusEntry>,
    /// Fraud-pattern corpus entries.
    pub fraud: Vec<CorpusEntry>,
}

impl RetrievalSettings {
    /// Entries for `kind`.
    pub fn corpus(&self, kind: CorpusKind) -> &[CorpusEntry] {
        match kind {
            CorpusKind::Banking => &self.banking,
            CorpusKind::Fraud => &self.fraud,
        }
    }
}

fn same_name(file: &str) -> CorpusEntry {
    CorpusEntry::new(file, file)
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 2,
            documents_dir: ".".to_string(),
            corpus: CorpusKind::Banking,
            banking: vec![
                same_name("bank_policy.txt"),
                CorpusEntry::new("loan_terms.txt", "loan_policy.txt"),
                same_name("faq.txt"),
            ],
            fraud: vec![
                same_name("digital_fraud_patterns.txt"),
                same_name("account_fraud_patterns.txt"),
                same_name("transaction_fraud_patterns.txt"),
                same_name("detection_prevention_patterns.txt"),
            ],
        }
    }
}

/// System prompts for each mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptSettings {
    /// One-shot banking questions.
    pub banking_system: String,
    /// Interactive fraud-pattern chat.
    pub fraud_expert_system: String,
    /// Transaction analysis in the monitor.
    pub fraud_analysis_system: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            banking_system: "You are a helpful banking assistant.".to_string(),
            fraud_expert_system: "You are a helpful banking assistant. An expert in fraud \
                detection and prevention. Provide information based on the context provided."
                .to_string(),
            fraud_analysis_system: "You are a fraud detection expert at a Nigerian bank. \
                Analyze if this transaction matches known fraud patterns and explain why."
                .to_string(),
        }
    }
}
