//! Chat-completion seam.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{AiLlmError, ChatMessage, LlmServiceProfiles};

/// Hosted chat model used for query rewriting and answering.
pub trait ChatProvider: Send + Sync {
    /// Runs one non-streaming completion and returns the assistant text.
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;
}

/// [`ChatProvider`] over the shared service's chat profile.
#[derive(Clone)]
pub struct OpenAiChat {
    svc: Arc<LlmServiceProfiles>,
}

impl OpenAiChat {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl ChatProvider for OpenAiChat {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
        Box::pin(self.svc.generate(messages))
    }
}
