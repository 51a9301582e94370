//! History-aware retrieval: rewrite the question, then search the index.

use std::sync::Arc;
use std::time::Instant;

use policy_index::{ChunkHit, EmbeddingsProvider, PolicyStore};
use tracing::{debug, info};

use crate::api_types::ConversationTurn;
use crate::error::QaError;
use crate::llm::ChatProvider;
use crate::prompt::build_rewrite_messages;

/// Turns follow-up questions into standalone queries and fetches context for them.
#[derive(Clone)]
pub struct HistoryAwareRetriever {
    chat: Arc<dyn ChatProvider>,
    store: Arc<PolicyStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl HistoryAwareRetriever {
    pub fn new(
        chat: Arc<dyn ChatProvider>,
        store: Arc<PolicyStore>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Self {
        Self {
            chat,
            store,
            embedder,
        }
    }

    /// Standalone search query for `question`.
    ///
    /// Without history the question is used as-is and the model is not called.
    pub async fn rewrite(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, QaError> {
        let question = question.trim();
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let messages = build_rewrite_messages(history, question);
        let started = Instant::now();
        let raw = self
            .chat
            .complete(&messages)
            .await
            .map_err(QaError::Rewrite)?;
        let query = clean_query(&raw).unwrap_or_else(|| question.to_string());
        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            turns = history.len(),
            query = %query,
            "query rewritten"
        );
        Ok(query)
    }

    /// Top-`top_k` chunks for `query`, dropping hits below `score_floor`.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_floor: Option<f32>,
    ) -> Result<Vec<ChunkHit>, QaError> {
        let hits = self
            .store
            .retrieve(query, self.embedder.as_ref(), top_k, score_floor)
            .await
            .map_err(QaError::Retrieval)?;
        debug!(
            hits = hits.len(),
            pages = ?hits.iter().map(|h| h.chunk.page).collect::<Vec<_>>(),
            "context retrieved"
        );
        Ok(hits)
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }
}

/// First meaningful line of the model reply, without quotes or a label.
fn clean_query(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let lower = line.to_ascii_lowercase();
    let line = ["standalone query:", "search query:", "query:"]
        .iter()
        .find_map(|p| lower.starts_with(p).then(|| line[p.len()..].trim()))
        .unwrap_or(line);
    let q = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’'))
        .trim();
    (!q.is_empty()).then(|| q.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_cleanup() {
        assert_eq!(
            clean_query("\"paternity leave duration\"").as_deref(),
            Some("paternity leave duration")
        );
        assert_eq!(
            clean_query("\n  Search query: parental leave for fathers\nextra").as_deref(),
            Some("parental leave for fathers")
        );
        assert_eq!(clean_query("   \n \"\" "), None);
    }
}
