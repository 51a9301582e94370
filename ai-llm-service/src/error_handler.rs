//! Unified error handling for `ai-llm-service`.
//!
//! A single top-level error type [`AiLlmError`] covers the whole library.
//! Configuration problems live in [`ConfigError`], failures reported by the
//! hosted API live in [`ProviderError`]. Small helpers for reading and
//! validating environment variables return the unified [`Result<T>`] alias.
//!
//! All messages include the prefix `[AI LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The hosted API answered, but not with something usable.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (connect, TLS, body read).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Maps a `reqwest` error, turning client-side deadline hits into [`AiLlmError::Timeout`].
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AiLlmError::Timeout(timeout)
        } else {
            AiLlmError::HttpTransport(err)
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors that realistically happen at config load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    /// Model name was empty.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Identifies which backend produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
}

/// Non-2xx answer from the upstream API.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Short, trimmed snippet of the response body.
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong while talking to the provider.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("config targets a different provider")]
    InvalidProvider,

    #[error("API key is missing")]
    MissingApiKey,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// 401/403 from the upstream.
    #[error("authentication rejected ({0})")]
    Unauthorized(HttpError),

    /// 429 from the upstream.
    #[error("rate limited ({0})")]
    RateLimited(HttpError),

    /// Any other non-success status.
    #[error("{0}")]
    HttpStatus(HttpError),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("response contained no choices")]
    EmptyChoices,
}

/// Failure attributed to a specific provider.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider:?}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }

    /// Classifies a non-success HTTP status into the matching kind.
    pub fn from_status(provider: Provider, err: HttpError) -> Self {
        let kind = match err.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::Unauthorized(err),
            StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited(err),
            _ => ProviderErrorKind::HttpStatus(err),
        };
        Self { provider, kind }
    }
}

/// Trims a response body down to a single-line snippet suitable for logs.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let cut: String = flat.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Returns the variable if set and non-empty, otherwise `default`.
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> HttpError {
        HttpError {
            status: StatusCode::from_u16(status).unwrap(),
            url: "https://api.openai.com/v1/chat/completions".into(),
            snippet: "{}".into(),
        }
    }

    #[test]
    fn status_classification() {
        let e = ProviderError::from_status(Provider::OpenAI, http(401));
        assert!(matches!(e.kind, ProviderErrorKind::Unauthorized(_)));

        let e = ProviderError::from_status(Provider::OpenAI, http(429));
        assert!(matches!(e.kind, ProviderErrorKind::RateLimited(_)));

        let e = ProviderError::from_status(Provider::OpenAI, http(500));
        assert!(matches!(e.kind, ProviderErrorKind::HttpStatus(_)));
    }

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = format!("line one\nline two {}", "x".repeat(1000));
        let s = make_snippet(&body);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= 241);
        assert!(s.starts_with("line one line two"));
    }

    #[test]
    fn endpoint_validation() {
        assert!(validate_http_endpoint("OPENAI_BASE_URL", "https://api.openai.com").is_ok());
        assert!(validate_http_endpoint("OPENAI_BASE_URL", "api.openai.com").is_err());
    }
}
