//! Retrieval-augmented answer driver.
//!
//! [`RagDriver::build`] loads and embeds every corpus document exactly once
//! and freezes the vectors into an [`EmbeddingStore`]. Queries then embed
//! only the question, rank it against the store, and hand the winning
//! document's text to the completion provider.

use std::collections::BTreeMap;
use std::sync::Arc;

use docrag_core::{CorpusEntry, DocumentError, DocumentSource, RetryConfig, RetryError, with_retry};
use docrag_embeddings::{EmbeddingError, EmbeddingService, EmbeddingStore, EmbeddingStoreBuilder, ScoredDocument};
use docrag_llm::{CompletionProvider, ProviderError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::prompts::PromptTemplate;

/// Errors surfaced by the driver, each naming the step that failed.
#[derive(Debug, Error)]
pub enum RagError {
    /// A corpus document could not be read.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Embedding a corpus document failed.
    #[error("failed to embed document '{document_id}': {source}")]
    Embedding {
        /// The document being embedded.
        document_id: String,
        /// Underlying error.
        #[source]
        source: EmbeddingError,
    },

    /// Embedding the query failed.
    #[error("failed to embed query: {0}")]
    QueryEmbedding(#[source] EmbeddingError),

    /// Ranking the query against the store failed.
    #[error("ranking failed: {0}")]
    Rank(#[source] EmbeddingError),

    /// The completion provider failed.
    #[error("completion failed: {0}")]
    Completion(#[source] ProviderError),

    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

/// Map a retry outcome, sending cancellation to [`RagError::Cancelled`].
fn from_retry<E>(err: RetryError<E>, wrap: impl FnOnce(E) -> RagError) -> RagError {
    match err {
        RetryError::Cancelled => RagError::Cancelled,
        RetryError::Failed { source, .. } => wrap(source),
    }
}

/// Driver parameters.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Number of matches returned by [`RagDriver::retrieve`].
    pub top_k: usize,
    /// Retry policy for every provider call.
    pub retry: RetryConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            retry: RetryConfig::default(),
        }
    }
}

/// Result of [`RagDriver::answer`].
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    /// Ranked matches, best first.
    pub matches: Vec<ScoredDocument>,
    /// Generated response.
    pub response: String,
}

impl Answer {
    /// The document used as context.
    pub fn best(&self) -> Option<&ScoredDocument> {
        self.matches.first()
    }

    /// The runner-up, when the store had more than one document.
    pub fn second(&self) -> Option<&ScoredDocument> {
        self.matches.get(1)
    }
}

/// Load → embed once → (embed query → rank → complete) per question.
pub struct RagDriver {
    config: DriverConfig,
    embedder: Arc<dyn EmbeddingService>,
    completer: Arc<dyn CompletionProvider>,
    documents: BTreeMap<String, String>,
    store: Arc<EmbeddingStore>,
    cancel: CancellationToken,
}

impl RagDriver {
    /// Load every entry of `corpus` and embed it.
    ///
    /// Any failure drops the partially filled builder, so no store exists
    /// unless every document was embedded.
    #[instrument(skip_all, fields(documents = corpus.len(), model = embedder.model()))]
    pub async fn build(
        config: DriverConfig,
        embedder: Arc<dyn EmbeddingService>,
        completer: Arc<dyn CompletionProvider>,
        source: Arc<dyn DocumentSource>,
        corpus: &[CorpusEntry],
        cancel: CancellationToken,
    ) -> Result<Self, RagError> {
        let mut builder = EmbeddingStoreBuilder::new();
        let mut documents = BTreeMap::new();

        for entry in corpus {
            if cancel.is_cancelled() {
                return Err(RagError::Cancelled);
            }
            let text = source.load_text(entry).await?;
            let vector = with_retry(&config.retry, &cancel, || embedder.embed_single(&text))
                .await
                .map_err(|e| {
                    from_retry(e, |source| RagError::Embedding {
                        document_id: entry.id.clone(),
                        source,
                    })
                })?;
            builder
                .insert(entry.id.clone(), vector)
                .map_err(|source| RagError::Embedding {
                    document_id: entry.id.clone(),
                    source,
                })?;
            debug!(id = %entry.id, chars = text.len(), "document embedded");
            let _ = documents.insert(entry.id.clone(), text);
        }

        let store = Arc::new(builder.build());
        info!(
            documents = store.len(),
            dimensions = store.dimensions(),
            "embedding store ready"
        );
        Ok(Self {
            config,
            embedder,
            completer,
            documents,
            store,
            cancel,
        })
    }

    /// The frozen store.
    pub fn store(&self) -> &Arc<EmbeddingStore> {
        &self.store
    }

    /// Raw text of a loaded document.
    pub fn document_text(&self, id: &str) -> Option<&str> {
        self.documents.get(id).map(String::as_str)
    }

    /// Embed `query` and rank it against the store.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredDocument>, RagError> {
        let vector = with_retry(&self.config.retry, &self.cancel, || {
            self.embedder.embed_single(query)
        })
        .await
        .map_err(|e| from_retry(e, RagError::QueryEmbedding))?;

        let matches = self
            .store
            .rank(&vector, self.config.top_k)
            .map_err(RagError::Rank)?;
        debug!(
            best = matches.first().map(|m| m.document_id.as_str()),
            "query ranked"
        );
        Ok(matches)
    }

    /// Retrieve, then answer `question` with the best document as context.
    #[instrument(skip_all, fields(question_chars = question.len()))]
    pub async fn answer(&self, question: &str, prompt: &PromptTemplate) -> Result<Answer, RagError> {
        let matches = self.retrieve(question).await?;
        let best = matches
            .first()
            .ok_or(RagError::Rank(EmbeddingError::EmptyStore))?;
        let context = self.document_text(&best.document_id).ok_or_else(|| {
            RagError::Document(DocumentError::NotFound {
                id: best.document_id.clone(),
            })
        })?;

        let request = prompt.request(context, question);
        let response = with_retry(&self.config.retry, &self.cancel, || {
            self.completer.complete(&request)
        })
        .await
        .map_err(|e| from_retry(e, RagError::Completion))?;

        Ok(Answer { matches, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletion;
    use docrag_core::StaticDocumentSource;
    use docrag_embeddings::MockEmbeddingService;

    const POLICY: &str = "Transfers above NGN5,000,000 require manager approval.";
    const LOANS: &str = "Maximum personal loans is NGN2,000,000";
    const FAQ: &str = "You can reset your password in the mobile app settings";

    fn corpus() -> Vec<CorpusEntry> {
        vec![
            CorpusEntry::new("bank_policy.txt", "bank_policy.txt"),
            CorpusEntry::new("loan_terms.txt", "loan_policy.txt"),
            CorpusEntry::new("faq.txt", "faq.txt"),
        ]
    }

    fn source() -> Arc<StaticDocumentSource> {
        Arc::new(
            StaticDocumentSource::new()
                .with("bank_policy.txt", POLICY)
                .with("loan_terms.txt", LOANS)
                .with("faq.txt", FAQ),
        )
    }

    fn embedder() -> MockEmbeddingService {
        MockEmbeddingService::new(3)
            .with_vector(POLICY, vec![1.0, 0.0, 0.0])
            .with_vector(LOANS, vec![0.0, 1.0, 0.0])
            .with_vector(FAQ, vec![0.0, 0.0, 1.0])
            .with_vector("What is the maximum amount for personal loans?", vec![0.1, 0.9, 0.0])
            .with_vector("blank", vec![0.0, 0.0, 0.0])
    }

    fn fast_retry() -> DriverConfig {
        DriverConfig {
            top_k: 2,
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 10,
                max_delay_ms: 50,
                jitter_factor: 0.0,
            },
        }
    }

    async fn driver_with(
        embedder: Arc<MockEmbeddingService>,
        completer: Arc<ScriptedCompletion>,
    ) -> RagDriver {
        RagDriver::build(
            fast_retry(),
            embedder,
            completer,
            source(),
            &corpus(),
            CancellationToken::new(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn embeds_each_document_once() {
        let embedder = Arc::new(embedder());
        let driver = driver_with(embedder.clone(), Arc::new(ScriptedCompletion::new())).await;
        assert_eq!(embedder.calls(), 3);
        assert_eq!(driver.store().len(), 3);

        let _ = driver.retrieve("faq").await.unwrap();
        let _ = driver.retrieve("faq").await.unwrap();
        assert_eq!(embedder.calls(), 5, "only the query is embedded per call");
    }

    #[tokio::test]
    async fn answer_uses_best_document_as_context() {
        let completer = Arc::new(ScriptedCompletion::new().reply("Up to NGN2,000,000."));
        let driver = driver_with(Arc::new(embedder()), completer.clone()).await;

        let answer = driver
            .answer(
                "What is the maximum amount for personal loans?",
                &PromptTemplate::banking("You are a helpful banking assistant."),
            )
            .await
            .unwrap();

        assert_eq!(answer.response, "Up to NGN2,000,000.");
        assert_eq!(answer.best().unwrap().document_id, "loan_terms.txt");
        assert_eq!(answer.second().unwrap().document_id, "bank_policy.txt");
        assert_eq!(answer.matches.len(), 2);

        let requests = completer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].context, LOANS);
        assert_eq!(requests[0].system, "You are a helpful banking assistant.");
    }

    #[tokio::test]
    async fn zero_query_fails_without_calling_completion() {
        let completer = Arc::new(ScriptedCompletion::new().reply("unused"));
        let driver = driver_with(Arc::new(embedder()), completer.clone()).await;

        let err = driver
            .answer("blank", &PromptTemplate::banking("sys"))
            .await
            .unwrap_err();
        match err {
            RagError::Rank(EmbeddingError::Comparison { document_id, .. }) => {
                assert_eq!(document_id, "bank_policy.txt");
            }
            other => panic!("expected rank error, got {other:?}"),
        }
        assert!(completer.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_document_aborts_build() {
        let err = RagDriver::build(
            fast_retry(),
            Arc::new(embedder()),
            Arc::new(ScriptedCompletion::new()),
            Arc::new(StaticDocumentSource::new().with("bank_policy.txt", POLICY)),
            &corpus(),
            CancellationToken::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            RagError::Document(DocumentError::NotFound { ref id }) if id == "loan_terms.txt"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_embedding_failures_are_retried() {
        let embedder = Arc::new(embedder().failing_first(2));
        let driver = driver_with(embedder.clone(), Arc::new(ScriptedCompletion::new())).await;
        assert_eq!(driver.store().len(), 3);
        assert_eq!(embedder.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn embedding_retry_waits_for_server_delay() {
        let embedder = Arc::new(embedder().failing_first(1).with_retry_after(30_000));
        let started = tokio::time::Instant::now();
        let driver = driver_with(embedder.clone(), Arc::new(ScriptedCompletion::new())).await;
        assert!(started.elapsed() >= std::time::Duration::from_secs(30));
        assert_eq!(driver.store().len(), 3);
        assert_eq!(embedder.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_name_the_document() {
        let err = RagDriver::build(
            fast_retry(),
            Arc::new(embedder().failing_first(3)),
            Arc::new(ScriptedCompletion::new()),
            source(),
            &corpus(),
            CancellationToken::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            RagError::Embedding { ref document_id, .. } if document_id == "bank_policy.txt"
        ));
    }

    #[tokio::test]
    async fn mixed_dimensions_are_rejected() {
        let embedder = MockEmbeddingService::new(3)
            .with_vector(POLICY, vec![1.0, 0.0, 0.0])
            .with_vector(LOANS, vec![1.0, 0.0]);
        let err = RagDriver::build(
            fast_retry(),
            Arc::new(embedder),
            Arc::new(ScriptedCompletion::new()),
            source(),
            &corpus(),
            CancellationToken::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            RagError::Embedding {
                ref document_id,
                source: EmbeddingError::DimensionMismatch { .. },
            } if document_id == "loan_terms.txt"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_errors_retry_then_surface() {
        let completer = Arc::new(
            ScriptedCompletion::new()
                .fail(ProviderError::Api {
                    status: 503,
                    message: "busy".into(),
                    code: None,
                    retryable: true,
                })
                .reply("recovered"),
        );
        let driver = driver_with(Arc::new(embedder()), completer.clone()).await;
        let answer = driver
            .answer("faq", &PromptTemplate::banking("sys"))
            .await
            .unwrap();
        assert_eq!(answer.response, "recovered");
        assert_eq!(completer.requests().len(), 2);

        let fatal = Arc::new(ScriptedCompletion::new().fail(ProviderError::Auth {
            message: "denied".into(),
        }));
        let driver = driver_with(Arc::new(embedder()), fatal.clone()).await;
        let err = driver
            .answer("faq", &PromptTemplate::banking("sys"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Completion(ProviderError::Auth { .. })));
        assert_eq!(fatal.requests().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_stops_build() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = RagDriver::build(
            fast_retry(),
            Arc::new(embedder()),
            Arc::new(ScriptedCompletion::new()),
            source(),
            &corpus(),
            cancel,
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, RagError::Cancelled));
    }

    #[tokio::test]
    async fn single_document_store_returns_one_match() {
        let driver = RagDriver::build(
            DriverConfig::default(),
            Arc::new(embedder()),
            Arc::new(ScriptedCompletion::new()),
            source(),
            &corpus()[..1],
            CancellationToken::new(),
        )
        .await
        .unwrap();
        let matches = driver.retrieve("anything").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].document_id, "bank_policy.txt");
    }
}
