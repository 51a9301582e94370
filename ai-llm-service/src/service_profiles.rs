//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Both HTTP clients are built eagerly so bad credentials or endpoints surface at startup.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{ChatMessage, LlmServiceProfiles};
//! use ai_llm_service::config::default_config::{config_openai_chat, config_openai_embedding};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_openai_chat()?,
//!     config_openai_embedding()?,
//! )?);
//!
//! let txt = svc.generate(&[ChatMessage::user("Hello")]).await?;
//! let emb = svc.embed("parental leave").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use crate::{
    config::llm_model_config::LlmModelConfig, error_handler::AiLlmError,
    services::open_ai_service::{ChatMessage, OpenAiService},
};

/// Owns one client per logical profile.
pub struct LlmServiceProfiles {
    chat: OpenAiService,
    embedding: OpenAiService,
}

impl LlmServiceProfiles {
    /// Creates the service and both underlying clients.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if either profile is invalid.
    pub fn new(chat: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(Self {
            chat: OpenAiService::new(chat)?,
            embedding: OpenAiService::new(embedding)?,
        })
    }

    /// Runs a chat completion with the **chat** profile.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        self.chat.generate(messages).await
    }

    /// Computes an embedding with the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        self.embedding.embeddings(input).await
    }

    /// Name of the embedding model; recorded in the index manifest.
    pub fn embedding_model(&self) -> &str {
        self.embedding.model()
    }
}
