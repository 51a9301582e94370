//! Policy document index: ingestion and retrieval over a local vector index.
//!
//! This crate provides:
//! - PDF page extraction and recursive, overlapping chunking with page provenance
//! - Embedding with bounded concurrency through a pluggable [`EmbeddingsProvider`]
//! - An exact in-memory vector index persisted atomically under one directory
//! - [`PolicyStore`], the facade the server and the `ingest` binary use

pub mod config;
pub mod embed;
mod embed_pool;
pub mod errors;
mod ingest;
pub mod loader;
mod normalize;
pub mod persist;
pub mod progress;
pub mod record;
pub mod splitter;
pub mod vector_index;

pub use config::{DistanceKind, IndexConfig};
pub use embed::EmbeddingsProvider;
pub use embed::openai::OpenAiEmbedder;
pub use errors::IndexError;
pub use ingest::IngestReport;
pub use loader::{DocumentLoader, PdfLoader, StaticPages};
pub use persist::{IndexManifest, index_ready};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use record::{ChunkHit, DocumentChunk, PageText, clamp_preview};
pub use vector_index::{FlatIndex, VectorIndex};

use tracing::{debug, info, trace, warn};

/// Loaded, read-only index plus its manifest.
///
/// Build once at startup and share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct PolicyStore {
    manifest: IndexManifest,
    index: FlatIndex,
}

impl PolicyStore {
    /// Loads an existing index from `dir`.
    ///
    /// # Errors
    /// [`IndexError::IndexMissing`] if nothing is there, [`IndexError::Corrupt`] if it is unreadable.
    pub fn load(dir: impl AsRef<std::path::Path>) -> Result<Self, IndexError> {
        let dir = dir.as_ref();
        let (manifest, entries) = persist::load(dir)?;
        let index = FlatIndex::from_entries(entries, manifest.distance).map_err(|e| {
            IndexError::Corrupt {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        info!(
            dir = %dir.display(),
            chunks = index.len(),
            pages = manifest.page_count,
            model = %manifest.embedding_model,
            "policy index loaded"
        );
        Ok(Self { manifest, index })
    }

    /// Rebuilds the index from the source document, replacing any existing one.
    pub async fn ingest(
        cfg: &IndexConfig,
        loader: &dyn DocumentLoader,
        provider: &dyn EmbeddingsProvider,
        progress: &dyn Progress,
    ) -> Result<(Self, IngestReport), IndexError> {
        let (report, manifest, index) =
            ingest::ingest_document(cfg, loader, provider, progress).await?;
        Ok((Self { manifest, index }, report))
    }

    /// Loads the index if `cfg.index_dir` is ready, otherwise ingests first.
    ///
    /// Loading performs no embedding calls.
    pub async fn open_or_ingest(
        cfg: &IndexConfig,
        loader: &dyn DocumentLoader,
        provider: &dyn EmbeddingsProvider,
        progress: &dyn Progress,
    ) -> Result<Self, IndexError> {
        if index_ready(&cfg.index_dir) {
            let store = Self::load(&cfg.index_dir)?;
            if store.manifest.embedding_model != provider.model_name() {
                warn!(
                    indexed_with = %store.manifest.embedding_model,
                    querying_with = %provider.model_name(),
                    "embedding model differs from the one used at ingestion"
                );
            }
            return Ok(store);
        }
        info!(
            dir = %cfg.index_dir.display(),
            "no index found, ingesting before serving"
        );
        let (store, _) = Self::ingest(cfg, loader, provider, progress).await?;
        Ok(store)
    }

    /// Embeds `query` and returns up to `top_k` chunks, best first.
    ///
    /// Hits scoring below `score_floor` (when set) are dropped, so the result
    /// may be empty.
    pub async fn retrieve(
        &self,
        query: &str,
        provider: &dyn EmbeddingsProvider,
        top_k: usize,
        score_floor: Option<f32>,
    ) -> Result<Vec<ChunkHit>, IndexError> {
        trace!(top_k, ?score_floor, "PolicyStore::retrieve");
        let qv = provider.embed(query).await?;
        let mut hits = self.index.search(&qv, top_k)?;
        if let Some(floor) = score_floor {
            hits.retain(|h| h.score >= floor);
        }
        debug!(
            hits = hits.len(),
            best = ?hits.first().map(|h| h.score),
            "retrieval done"
        );
        Ok(hits)
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }
}
