//! Embedding abstraction.

use crate::errors::IndexError;
use std::{future::Future, pin::Pin};

/// Asynchronous embedding provider.
///
/// Implement this trait to plug in an embedding backend. Real providers
/// perform an HTTP request per call; tests plug in deterministic fakes.
pub trait EmbeddingsProvider: Send + Sync {
    /// Produces an embedding vector for the given text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>;

    /// Model name recorded in the index manifest.
    fn model_name(&self) -> &str;
}

pub mod openai;
