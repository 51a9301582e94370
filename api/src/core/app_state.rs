use std::{net::SocketAddr, sync::Arc, time::Duration};

use policy_qa::Assistant;
use thiserror::Error;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Answers questions; holds the loaded index.
    pub assistant: Arc<Assistant>,
    /// Deadline for a whole `/chat` request.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>, request_timeout: Duration) -> Self {
        Self {
            assistant,
            request_timeout,
        }
    }
}

/// Invalid server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: invalid socket address `{value}`")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var}: expected a positive integer, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },
}

/// Listener and request settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub request_timeout: Duration,
    /// Tokio worker threads; `None` uses the runtime default.
    pub worker_threads: Option<usize>,
}

impl ServerConfig {
    pub const DEFAULT_ADDRESS: &'static str = "127.0.0.1:5000";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

    /// Reads `API_ADDRESS`, `PORT`, `REQUEST_TIMEOUT_SECS` and `WORKER_THREADS`.
    ///
    /// `PORT`, when set, wins over `API_ADDRESS` and binds all interfaces.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (var, raw) = match get("PORT") {
            Some(port) => ("PORT", format!("0.0.0.0:{port}")),
            None => (
                "API_ADDRESS",
                get("API_ADDRESS").unwrap_or_else(|| Self::DEFAULT_ADDRESS.to_string()),
            ),
        };
        let address = raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress { var, value: raw })?;

        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => positive("REQUEST_TIMEOUT_SECS", &v)? as u64,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };
        let worker_threads = get("WORKER_THREADS")
            .map(|v| positive("WORKER_THREADS", &v))
            .transpose()?;

        Ok(Self {
            address,
            request_timeout: Duration::from_secs(timeout_secs),
            worker_threads,
        })
    }
}

fn positive(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}
