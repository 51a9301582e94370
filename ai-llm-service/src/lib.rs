//! Shared client for the hosted language model.
//!
//! Two logical profiles are exposed through [`service_profiles::LlmServiceProfiles`]:
//! - **chat**      → chat completions (query rewriting and grounded answers)
//! - **embedding** → fixed-dimension vectors for chunks and queries
//!
//! Only OpenAI-compatible REST endpoints are supported.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use service_profiles::LlmServiceProfiles;
pub use services::open_ai_service::{ChatMessage, ChatRole};
