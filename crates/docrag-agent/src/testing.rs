//! Test doubles shared by the binary's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use docrag_llm::{CompletionProvider, CompletionRequest, ProviderError, ProviderResult};

/// Completion provider that replays queued outcomes and records requests.
///
/// When the queue is empty it echoes the question back.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    outcomes: Mutex<VecDeque<ProviderResult<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, text: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub(crate) fn fail(self, err: ProviderError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(format!("echo: {}", request.question)))
    }
}
