//! Typed error for the policy-qa crate.

use ai_llm_service::AiLlmError;
use policy_index::IndexError;
use thiserror::Error;

use crate::api_types::RequestStage;

#[derive(Debug, Error)]
pub enum QaError {
    /// Nothing to answer.
    #[error("question is empty")]
    EmptyQuestion,

    /// The chat model failed while turning the question into a search query.
    #[error("query rewrite failed: {0}")]
    Rewrite(#[source] AiLlmError),

    /// Embedding the query or searching the index failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] IndexError),

    /// The chat model failed while answering.
    #[error("answer generation failed: {0}")]
    Generation(#[source] AiLlmError),
}

impl QaError {
    /// Stage that was in progress when the request failed.
    pub fn stage(&self) -> RequestStage {
        match self {
            QaError::EmptyQuestion => RequestStage::Received,
            QaError::Rewrite(_) => RequestStage::QueryRewritten,
            QaError::Retrieval(_) => RequestStage::Retrieved,
            QaError::Generation(_) => RequestStage::Answered,
        }
    }
}
