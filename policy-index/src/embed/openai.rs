//! OpenAI embedding provider on top of the shared LLM service.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;

use crate::{EmbeddingsProvider, IndexError};

/// Embeds text with the service's embedding profile.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected dimension, if pinned by configuration.
    dim: Option<usize>,
}

impl OpenAiEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;
            if let Some(want) = self.dim {
                if v.len() != want {
                    return Err(IndexError::VectorSizeMismatch { got: v.len(), want });
                }
            }
            Ok(v)
        })
    }

    fn model_name(&self) -> &str {
        self.svc.embedding_model()
    }
}
