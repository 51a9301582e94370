//! Ingestion and index configuration.

use std::path::PathBuf;

use crate::errors::IndexError;

/// Similarity function used by the vector index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    /// Cosine similarity (recommended for OpenAI embeddings).
    Cosine,
    /// Raw dot product (equivalent to cosine for normalized vectors).
    Dot,
    /// Euclidean distance, reported as a negated score so "higher is closer" holds.
    Euclid,
}

impl DistanceKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cosine" => Some(Self::Cosine),
            "dot" => Some(Self::Dot),
            "euclid" | "euclidean" | "l2" => Some(Self::Euclid),
            _ => None,
        }
    }
}

/// Configuration for ingestion and the persisted index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Directory holding `manifest.json` and `chunks.jsonl`.
    pub index_dir: PathBuf,
    /// PDF to ingest.
    pub source_pdf: PathBuf,
    /// Human-readable label attached to every chunk.
    pub source_label: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks of the same page.
    pub chunk_overlap: usize,
    /// Similarity function.
    pub distance: DistanceKind,
    /// Maximum in-flight embedding requests during ingestion.
    pub embedding_concurrency: usize,
    /// If set, every embedding must have exactly this many dimensions.
    pub embedding_dim: Option<usize>,
}

impl IndexConfig {
    /// Defaults matching the shipped HR policy document.
    pub fn new_default(
        index_dir: impl Into<PathBuf>,
        source_pdf: impl Into<PathBuf>,
    ) -> Self {
        Self {
            index_dir: index_dir.into(),
            source_pdf: source_pdf.into(),
            source_label: "Nestlé HR Policy (2012)".into(),
            chunk_size: 800,
            chunk_overlap: 150,
            distance: DistanceKind::Cosine,
            embedding_concurrency: 4,
            embedding_dim: None,
        }
    }

    /// Build from environment variables, falling back to [`IndexConfig::new_default`].
    ///
    /// # Errors
    /// Returns `IndexError::Config` for unparsable numbers, unknown distances,
    /// or values rejected by [`IndexConfig::validate`].
    pub fn from_env() -> Result<Self, IndexError> {
        let mut cfg = Self::new_default(
            env("INDEX_DIR", "policy_index"),
            env("SOURCE_PDF", "./the_nestle_hr_policy_pdf_2012.pdf"),
        );

        if let Some(label) = opt_env("SOURCE_LABEL") {
            cfg.source_label = label;
        }
        if let Some(v) = parse_env::<usize>("CHUNK_SIZE")? {
            cfg.chunk_size = v;
        }
        if let Some(v) = parse_env::<usize>("CHUNK_OVERLAP")? {
            cfg.chunk_overlap = v;
        }
        if let Some(v) = parse_env::<usize>("EMBEDDING_CONCURRENCY")? {
            cfg.embedding_concurrency = v;
        }
        cfg.embedding_dim = parse_env::<usize>("EMBEDDING_DIM")?;
        if let Some(d) = opt_env("RAG_DISTANCE") {
            cfg.distance = DistanceKind::parse(&d)
                .ok_or_else(|| IndexError::Config(format!("RAG_DISTANCE: unknown distance `{d}`")))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.index_dir.as_os_str().is_empty() {
            return Err(IndexError::Config("index_dir is empty".into()));
        }
        if self.index_dir.file_name().is_none() {
            return Err(IndexError::Config(
                "index_dir must name a directory, not a root or `..`".into(),
            ));
        }
        if self.source_pdf.as_os_str().is_empty() {
            return Err(IndexError::Config("source_pdf is empty".into()));
        }
        if self.chunk_size == 0 {
            return Err(IndexError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IndexError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_concurrency == 0 {
            return Err(IndexError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(IndexError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

fn env(k: &str, dflt: &str) -> String {
    opt_env(k).unwrap_or_else(|| dflt.to_string())
}

fn opt_env(k: &str) -> Option<String> {
    std::env::var(k).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(k: &str) -> Result<Option<T>, IndexError> {
    match opt_env(k) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| IndexError::Config(format!("{k}: expected a number, got `{v}`"))),
        None => Ok(None),
    }
}
