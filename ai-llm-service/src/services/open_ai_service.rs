//! OpenAI service for chat completions and embeddings.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions (chat completion)
//! - POST {endpoint}/v1/embeddings (embeddings)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! No retries happen here; a failed call surfaces to the caller as-is.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Keeps a preconfigured
/// `reqwest::Client` with the bearer header and a request timeout.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey))?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.trim())).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(AiLlmError::HttpTransport)?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{base}/v1/chat/completions");
        let url_embeddings = format!("{base}/v1/embeddings");

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embeddings,
        })
    }

    /// Model identifier this client sends.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a non-streaming chat completion over a full transcript.
    ///
    /// # Errors
    /// - `Unauthorized` / `RateLimited` / `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Timeout`] when the request deadline is hit
    /// - [`AiLlmError::HttpTransport`] for other network failures
    /// - `Decode` / `EmptyChoices` for unusable payloads
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, messages);

        debug!(
            model = %self.cfg.model,
            messages = messages.len(),
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "POST {}", self.url_chat
        );

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_chat, started).await);
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /v1/chat/completions response"
            );
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                )),
            )
            .into()
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            answer_chars = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves a single embedding vector via `/v1/embeddings`.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(
            model = %self.cfg.model,
            input_len = input.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_embeddings, started).await);
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /v1/embeddings response"
            );
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `data[0].embedding`")),
            )
            .into()
        })?;

        let first = out.data.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode("empty `data` in embeddings response".into()),
            )
        })?;

        debug!(
            model = %self.cfg.model,
            dim = first.embedding.len(),
            latency_ms = started.elapsed().as_millis(),
            "embeddings completed"
        );

        Ok(first.embedding)
    }

    async fn status_error(&self, resp: reqwest::Response, url: &str, started: Instant) -> AiLlmError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "OpenAI returned non-success status"
        );

        ProviderError::from_status(
            Provider::OpenAI,
            HttpError {
                status,
                url: url.to_string(),
                snippet,
            },
        )
        .into()
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, messages: &'a [ChatMessage]) -> Self {
        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/".into(),
            api_key: Some("sk-test".into()),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn chat_request_shape() {
        let cfg = cfg();
        let messages = vec![
            ChatMessage::system("be precise"),
            ChatMessage::user("What is the leave policy?"),
        ];
        let body = ChatCompletionRequest::from_cfg(&cfg, &messages);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["temperature"], 0.0);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn response_without_content_is_skipped() {
        let raw = r#"{"choices":[{"message":{"content":null}},{"message":{"content":"ok"}}]}"#;
        let out: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = out.choices.into_iter().find_map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("ok"));
    }

    #[test]
    fn constructor_rejects_missing_key_and_bad_endpoint() {
        let mut no_key = cfg();
        no_key.api_key = None;
        assert!(matches!(
            OpenAiService::new(no_key),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            }))
        ));

        let mut bad = cfg();
        bad.endpoint = "api.openai.com".into();
        assert!(matches!(
            OpenAiService::new(bad),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidEndpoint(_),
                ..
            }))
        ));
    }

    #[test]
    fn urls_are_derived_from_base() {
        let svc = OpenAiService::new(cfg()).unwrap();
        assert_eq!(svc.url_chat, "https://api.openai.com/v1/chat/completions");
        assert_eq!(svc.url_embeddings, "https://api.openai.com/v1/embeddings");
    }
}
