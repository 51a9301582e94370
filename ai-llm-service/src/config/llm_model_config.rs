use crate::config::llm_provider::LlmProvider;

/// Configuration for a single hosted model profile.
///
/// # Fields
///
/// - `provider`: backend speaking the OpenAI protocol.
/// - `model`: model identifier (e.g. `"gpt-4o-mini"`, `"text-embedding-3-small"`).
/// - `endpoint`: API base URL without the `/v1/...` suffix.
/// - `api_key`: bearer credential; required by [`OpenAiService::new`](crate::services::open_ai_service::OpenAiService::new).
/// - `max_tokens`: optional completion budget.
/// - `temperature`: sampling temperature, `0.0` for deterministic answers.
/// - `top_p`: optional nucleus sampling cutoff.
/// - `timeout_secs`: per-request timeout; `None` means 60 seconds.
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
