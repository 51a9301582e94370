//! Question answering over the HR policy index.
//!
//! Public API: [`Assistant::ask`]. It rewrites the question into a standalone
//! search query using the conversation so far, retrieves the top-K chunks from
//! `policy-index`, builds a grounded prompt with `[Page N]` excerpts, calls the
//! chat model once and returns the answer with its distinct cited pages.

mod answer;
mod api_types;
mod cfg;
mod error;
mod llm;
pub mod prompt;
mod retrieve;

pub use answer::{AnswerGenerator, cite_pages, is_not_found, split_sources};
pub use api_types::{AnswerResult, AskOptions, ConversationTurn, RequestStage, SourceRef};
pub use cfg::{ConfigError, QaConfig};
pub use error::QaError;
pub use llm::{ChatProvider, OpenAiChat};
pub use prompt::NOT_FOUND_ANSWER;
pub use retrieve::HistoryAwareRetriever;

use std::sync::Arc;
use std::time::Instant;

use policy_index::{EmbeddingsProvider, PolicyStore};
use tracing::{debug, info, warn};

/// Retriever plus generator, shared by every request.
///
/// Holds only immutable state; wrap in `Arc` and call [`Assistant::ask`] concurrently.
#[derive(Clone)]
pub struct Assistant {
    retriever: HistoryAwareRetriever,
    generator: AnswerGenerator,
    cfg: QaConfig,
}

impl Assistant {
    pub fn new(
        store: Arc<PolicyStore>,
        embedder: Arc<dyn EmbeddingsProvider>,
        chat: Arc<dyn ChatProvider>,
        cfg: QaConfig,
    ) -> Self {
        Self {
            retriever: HistoryAwareRetriever::new(chat.clone(), store, embedder),
            generator: AnswerGenerator::new(chat, cfg.preview_chars),
            cfg,
        }
    }

    /// Answers `question` in the context of `history`.
    ///
    /// Any `AskOptions` field set to `0` is replaced by the corresponding value
    /// from [`QaConfig`]. Only the last `max_history_turns` turns are used.
    ///
    /// # Errors
    /// [`QaError`] naming the stage that failed. An empty retrieval is not an
    /// error: it yields the not-found answer.
    pub async fn ask(
        &self,
        question: &str,
        history: &[ConversationTurn],
        opts: AskOptions,
    ) -> Result<AnswerResult, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }
        let started = Instant::now();
        let top_k = if opts.top_k == 0 {
            self.cfg.top_k
        } else {
            opts.top_k
        };
        let max_ctx_chars = if opts.max_ctx_chars == 0 {
            self.cfg.max_ctx_chars
        } else {
            opts.max_ctx_chars
        };
        let history = recent(history, self.cfg.max_history_turns);
        debug!(stage = %RequestStage::Received, turns = history.len(), top_k, "ask");

        let result = self.run(question, history, top_k, max_ctx_chars).await;
        match &result {
            Ok(r) => info!(
                stage = %RequestStage::Returned,
                pages = ?r.pages,
                latency_ms = started.elapsed().as_millis() as u64,
                "question answered"
            ),
            Err(e) => warn!(
                stage = %e.stage(),
                error = %e,
                latency_ms = started.elapsed().as_millis() as u64,
                "question failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        question: &str,
        history: &[ConversationTurn],
        top_k: usize,
        max_ctx_chars: usize,
    ) -> Result<AnswerResult, QaError> {
        let query = self.retriever.rewrite(question, history).await?;
        debug!(stage = %RequestStage::QueryRewritten, query = %query);

        let hits = self
            .retriever
            .retrieve(&query, top_k, self.cfg.score_floor)
            .await?;
        debug!(stage = %RequestStage::Retrieved, hits = hits.len());

        let result = self
            .generator
            .answer(history, question, &query, &hits, max_ctx_chars)
            .await?;
        debug!(stage = %RequestStage::Answered, pages = ?result.pages);
        Ok(result)
    }

    pub fn store(&self) -> &PolicyStore {
        self.retriever.store()
    }

    pub fn config(&self) -> &QaConfig {
        &self.cfg
    }
}

fn recent(history: &[ConversationTurn], max_turns: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(max_turns)..]
}
