//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for ingestion and retrieval.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The source document does not exist.
    #[error("source document not found: {0}")]
    SourceMissing(PathBuf),

    /// The PDF could not be read or parsed.
    #[error("failed to extract text from {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    /// The document parsed but produced no text to index.
    #[error("document {0} contains no extractable text")]
    EmptyDocument(PathBuf),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The embedding service failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] ai_llm_service::AiLlmError),

    /// No index exists at the expected location.
    #[error("no index found at {0}")]
    IndexMissing(PathBuf),

    /// The index directory exists but its content is unusable.
    #[error("index at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Another ingestion run holds the lock.
    #[error("another ingestion is already running (lock file {0}); remove it if that run crashed")]
    IngestionInProgress(PathBuf),
}
