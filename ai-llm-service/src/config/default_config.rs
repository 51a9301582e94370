//! Default model configs loaded from environment variables.
//!
//! Two roles are provided:
//!
//! - **Chat**      → query rewriting and grounded answering
//! - **Embedding** → chunk and query vectors
//!
//! # Environment variables
//!
//! - `LLM_KIND`         = provider kind (only `openai` is accepted, default `openai`)
//! - `OPENAI_API_KEY`   = bearer credential (mandatory)
//! - `OPENAI_BASE_URL`  = API base (default `https://api.openai.com`)
//! - `CHAT_MODEL`       = chat model (default `gpt-4o-mini`)
//! - `EMBEDDING_MODEL`  = embedding model (default `text-embedding-3-small`)
//! - `LLM_MAX_TOKENS`   = optional completion budget (u32)
//! - `LLM_TIMEOUT_SECS` = per-request timeout (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, env_or, must_env,
        validate_http_endpoint,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Fields shared by both profiles.
struct Common {
    provider: LlmProvider,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

fn common() -> Result<Common, AiLlmError> {
    let kind = env_or("LLM_KIND", "openai");
    let provider =
        LlmProvider::parse(&kind).ok_or_else(|| ConfigError::UnsupportedProvider(kind.clone()))?;

    let endpoint = env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL);
    validate_http_endpoint("OPENAI_BASE_URL", &endpoint)?;

    let api_key = must_env("OPENAI_API_KEY")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::OutOfRange {
            field: "LLM_TIMEOUT_SECS",
            detail: "must be at least 1 second",
        }
        .into());
    }

    Ok(Common {
        provider,
        endpoint,
        api_key,
        timeout_secs,
    })
}

fn model_from_env(var: &'static str, default: &str) -> Result<String, AiLlmError> {
    let model = env_or(var, default);
    if model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    Ok(model)
}

/// Config for the **chat** model.
///
/// # Defaults
/// - `temperature = Some(0.0)`
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    let c = common()?;
    Ok(LlmModelConfig {
        provider: c.provider,
        model: model_from_env("CHAT_MODEL", DEFAULT_CHAT_MODEL)?,
        endpoint: c.endpoint,
        api_key: Some(c.api_key),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(c.timeout_secs),
    })
}

/// Config for the **embedding** model.
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let c = common()?;
    Ok(LlmModelConfig {
        provider: c.provider,
        model: model_from_env("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL)?,
        endpoint: c.endpoint,
        api_key: Some(c.api_key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(c.timeout_secs),
    })
}
