//! End-to-end ingestion: PDF pages → chunks → embeddings → persisted index.
//!
//! The on-disk index is only replaced after every chunk has been embedded, so a
//! failed run leaves whatever was there before (or nothing).

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::IndexConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_chunks;
use crate::errors::IndexError;
use crate::loader::{DocumentLoader, display_path};
use crate::persist::{FORMAT_VERSION, IndexManifest, IngestLock, save_atomic};
use crate::progress::Progress;
use crate::splitter::RecursiveSplitter;
use crate::vector_index::{FlatIndex, VectorIndex};

/// Summary of a finished ingestion run.
#[derive(Clone, Debug)]
pub struct IngestReport {
    /// Pages that contributed at least one chunk.
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub elapsed: Duration,
}

/// Runs the full pipeline and persists the result at `cfg.index_dir`.
///
/// Returns the in-memory index alongside its manifest so callers can serve it
/// without reading it back from disk.
///
/// # Errors
/// - [`IndexError::IngestionInProgress`] if another run holds the lock
/// - [`IndexError::SourceMissing`] / [`IndexError::Pdf`] from the loader
/// - [`IndexError::EmptyDocument`] when no chunk could be produced
/// - embedding and persistence failures
pub async fn ingest_document(
    cfg: &IndexConfig,
    loader: &dyn DocumentLoader,
    provider: &dyn EmbeddingsProvider,
    progress: &dyn Progress,
) -> Result<(IngestReport, IndexManifest, FlatIndex), IndexError> {
    cfg.validate()?;
    let _lock = IngestLock::acquire(&cfg.index_dir)?;
    let started = Instant::now();

    info!(
        source = %cfg.source_pdf.display(),
        index_dir = %cfg.index_dir.display(),
        chunk_size = cfg.chunk_size,
        chunk_overlap = cfg.chunk_overlap,
        "ingestion started"
    );

    progress.message("extracting pages");
    let pages = loader.load_pages(&cfg.source_pdf).await?;
    if pages.is_empty() {
        warn!(source = %cfg.source_pdf.display(), "no page contains text");
        return Err(IndexError::EmptyDocument(cfg.source_pdf.clone()));
    }

    progress.message("splitting pages");
    let splitter = RecursiveSplitter::new(cfg.chunk_size, cfg.chunk_overlap);
    let chunks = splitter.split_pages(&pages, &cfg.source_label);
    if chunks.is_empty() {
        return Err(IndexError::EmptyDocument(cfg.source_pdf.clone()));
    }
    info!(pages = pages.len(), chunks = chunks.len(), "document split");

    let entries = embed_chunks(
        chunks,
        provider,
        cfg.embedding_dim,
        cfg.embedding_concurrency,
        progress,
    )
    .await?;

    let index = FlatIndex::from_entries(entries, cfg.distance)?;
    let manifest = IndexManifest {
        format_version: FORMAT_VERSION,
        source_path: display_path(&cfg.source_pdf).display().to_string(),
        source_label: cfg.source_label.clone(),
        embedding_model: provider.model_name().to_string(),
        dimension: index.dimension(),
        distance: cfg.distance,
        chunk_size: cfg.chunk_size,
        chunk_overlap: cfg.chunk_overlap,
        chunk_count: index.len(),
        page_count: index.page_count(),
        created_at: Utc::now(),
    };

    progress.message("writing index");
    save_atomic(&cfg.index_dir, &manifest, index.entries())?;

    let report = IngestReport {
        pages: manifest.page_count,
        chunks: manifest.chunk_count,
        dimension: manifest.dimension,
        elapsed: started.elapsed(),
    };
    progress.finish("index ready");
    info!(
        pages = report.pages,
        chunks = report.chunks,
        dim = report.dimension,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "ingestion finished"
    );
    Ok((report, manifest, index))
}
