//! # docrag
//!
//! Retrieval-augmented answers over a small document corpus: every document
//! is embedded once, each question is ranked against those vectors, and the
//! best match is handed to a chat model as context.

#![deny(unsafe_code)]

mod console;
mod driver;
mod prompts;
mod scenarios;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docrag_core::FsDocumentSource;
use docrag_llm::{ApiFlavor, OpenAIClient, OpenAIConfig};
use docrag_settings::{CorpusKind, DocragSettings, ProviderKind, ProviderSettings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::console::{Console, ConsoleError};
use crate::driver::{DriverConfig, RagDriver};
use crate::prompts::PromptSet;

const DEFAULT_QUESTION: &str = "What is the maximum amount for personal loans?";

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// Document retrieval with LLM answers.
#[derive(Parser, Debug)]
#[command(name = "docrag", version, about = "Retrieval-augmented answers over a small document corpus")]
struct Cli {
    /// Settings file (default: `~/.docrag/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Directory the corpus paths are relative to.
    #[arg(long, global = true)]
    documents_dir: Option<PathBuf>,

    /// Corpus to retrieve from (`chat` and `monitor` default to `fraud`).
    #[arg(long, global = true)]
    corpus: Option<CorpusKind>,

    /// Number of matches to rank.
    #[arg(long, global = true)]
    top_k: Option<usize>,

    /// Log filter when `RUST_LOG` is unset (e.g. `info`, `docrag=debug`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Answer one question and show the two best matching documents.
    Ask {
        /// The question.
        #[arg(default_value = DEFAULT_QUESTION)]
        question: String,
    },
    /// Ask questions about fraud patterns until `exit`.
    Chat,
    /// Fraud monitoring menu over generated or typed transactions.
    Monitor,
}

impl Cli {
    /// Apply command-line overrides on top of file and env settings.
    fn apply(&self, settings: &mut DocragSettings) {
        if let Some(dir) = &self.documents_dir {
            settings.retrieval.documents_dir = dir.display().to_string();
        }
        if let Some(k) = self.top_k {
            settings.retrieval.top_k = k;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if let Some(corpus) = self.corpus {
            settings.retrieval.corpus = corpus;
        }
    }

    /// Corpus for the selected command.
    fn corpus_kind(&self, settings: &DocragSettings) -> CorpusKind {
        match self.command {
            Command::Ask { .. } => settings.retrieval.corpus,
            Command::Chat | Command::Monitor => self.corpus.unwrap_or(CorpusKind::Fraud),
        }
    }
}

fn load_settings(cli: &Cli) -> Result<DocragSettings> {
    let mut settings = match &cli.settings {
        Some(path) => docrag_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => docrag_settings::load_settings().context("Failed to load settings")?,
    };
    cli.apply(&mut settings);
    Ok(settings)
}

fn openai_config(provider: &ProviderSettings, api_key: String) -> OpenAIConfig {
    let flavor = match provider.kind {
        ProviderKind::Azure => ApiFlavor::Azure,
        ProviderKind::OpenAi => ApiFlavor::OpenAi,
    };
    OpenAIConfig {
        flavor,
        base_url: provider.base_url.clone(),
        api_key,
        api_version: provider.api_version.clone(),
        embedding_model: provider.embedding_model.clone(),
        completion_model: provider.completion_model.clone(),
        timeout: Duration::from_millis(provider.timeout_ms),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    docrag_core::logging::init_subscriber(&settings.logging.level);
    settings.validate().context("Invalid settings")?;

    let key_var = &settings.provider.api_key_env;
    let api_key = std::env::var(key_var)
        .with_context(|| format!("{key_var} is not set (add it to the environment or .env)"))?;
    let client = Arc::new(
        OpenAIClient::new(openai_config(&settings.provider, api_key))
            .context("Failed to create HTTP client")?,
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            signal_token.cancel();
        }
    }));

    let kind = cli.corpus_kind(&settings);
    let corpus = settings.retrieval.corpus(kind);
    let source = Arc::new(FsDocumentSource::new(&settings.retrieval.documents_dir));
    info!(corpus = %kind, dir = %settings.retrieval.documents_dir, "indexing corpus");

    let config = DriverConfig {
        top_k: settings.retrieval.top_k,
        retry: settings.retry.clone(),
    };
    let driver = match RagDriver::build(
        config,
        client.clone(),
        client,
        source,
        corpus,
        cancel.clone(),
    )
    .await
    {
        Ok(driver) => driver,
        Err(driver::RagError::Cancelled) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => return Err(e).context("Failed to index documents"),
    };
    info!(
        documents = driver.store().len(),
        top_k = settings.retrieval.top_k,
        "ready"
    );

    let prompts = PromptSet::from_settings(&settings.prompts);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = std::io::stdout();

    let outcome = match &cli.command {
        Command::Ask { question } => {
            console::ask(&driver, &prompts.banking, question, &mut stdout.lock()).await
        }
        Command::Chat => {
            Console::new(stdin, stdout.lock(), cancel)
                .chat(&driver, &prompts.fraud_expert)
                .await
        }
        Command::Monitor => {
            let mut rng = StdRng::from_os_rng();
            Console::new(stdin, stdout.lock(), cancel)
                .monitor(&driver, &prompts.fraud_analysis, &settings.monitor, &mut rng)
                .await
        }
    };

    match outcome {
        Ok(()) => Ok(()),
        // A pending stdin read would keep the runtime alive on shutdown.
        Err(e) if e.is_cancelled() => std::process::exit(EXIT_INTERRUPTED),
        Err(ConsoleError::Rag(e)) => Err(e).context("Request failed"),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_defaults_question() {
        let cli = Cli::try_parse_from(["docrag", "ask"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Ask {
                question: DEFAULT_QUESTION.into()
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docrag",
            "chat",
            "--top-k",
            "3",
            "--corpus",
            "banking",
            "--documents-dir",
            "/srv/docs",
        ])
        .unwrap();
        let mut settings = DocragSettings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.retrieval.documents_dir, "/srv/docs");
        assert_eq!(cli.corpus_kind(&settings), CorpusKind::Banking);
    }

    #[test]
    fn corpus_defaults_per_command() {
        let settings = DocragSettings::default();
        let ask = Cli::try_parse_from(["docrag", "ask", "q"]).unwrap();
        let monitor = Cli::try_parse_from(["docrag", "monitor"]).unwrap();
        assert_eq!(ask.corpus_kind(&settings), CorpusKind::Banking);
        assert_eq!(monitor.corpus_kind(&settings), CorpusKind::Fraud);
    }

    #[test]
    fn unknown_corpus_rejected() {
        assert!(Cli::try_parse_from(["docrag", "ask", "--corpus", "legal"]).is_err());
    }

    #[test]
    fn openai_config_from_settings() {
        let mut provider = ProviderSettings::default();
        provider.kind = ProviderKind::OpenAi;
        provider.base_url = "https://api.openai.com".into();
        provider.timeout_ms = 1_500;
        let config = openai_config(&provider, "sk-test".into());
        assert_eq!(config.flavor, ApiFlavor::OpenAi);
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert_eq!(config.api_key, "sk-test");
    }
}
