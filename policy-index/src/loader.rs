//! Document loaders.
//!
//! Ingestion only needs "give me the text of every page"; [`DocumentLoader`]
//! keeps the PDF backend swappable and lets tests feed pages directly.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info, warn};

use crate::errors::IndexError;
use crate::normalize::normalize_page_text;
use crate::record::PageText;

/// Source of page-level text.
pub trait DocumentLoader: Send + Sync {
    /// Returns the non-empty pages of the document, 1-based and in order.
    fn load_pages<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PageText>, IndexError>> + Send + 'a>>;
}

/// PDF loader backed by `pdf-extract`.
///
/// Extraction is CPU-bound and runs on the blocking pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load_pages<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PageText>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            if !path.is_file() {
                return Err(IndexError::SourceMissing(path.to_path_buf()));
            }
            info!(path = %path.display(), "extracting PDF text");

            let owned = path.to_path_buf();
            // pdf-extract panics on some malformed fonts and encodings.
            tokio::task::spawn_blocking(move || extract_pages(&owned))
                .await
                .map_err(|e| IndexError::Pdf {
                    path: path.to_path_buf(),
                    reason: if e.is_panic() {
                        "PDF parser panicked".into()
                    } else {
                        e.to_string()
                    },
                })?
        })
    }
}

fn extract_pages(path: &Path) -> Result<Vec<PageText>, IndexError> {
    let raw = pdf_extract::extract_text_by_pages(path).map_err(|e| IndexError::Pdf {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let total = raw.len();
    let pages = pages_from_raw(raw);
    if pages.len() < total {
        warn!(
            total,
            with_text = pages.len(),
            "some PDF pages contain no extractable text"
        );
    }
    debug!(pages = pages.len(), "PDF text extracted");
    Ok(pages)
}

/// Normalizes raw per-page strings and drops empty pages, keeping original numbering.
pub fn pages_from_raw(raw: Vec<String>) -> Vec<PageText> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let text = normalize_page_text(&text);
            if text.is_empty() {
                None
            } else {
                Some(PageText {
                    page: i as u32 + 1,
                    text,
                })
            }
        })
        .collect()
}

/// Loader over pages already in memory. Ignores the path.
#[derive(Clone, Debug, Default)]
pub struct StaticPages {
    pages: Vec<PageText>,
}

impl StaticPages {
    pub fn new(raw_pages: Vec<String>) -> Self {
        Self {
            pages: pages_from_raw(raw_pages),
        }
    }
}

impl DocumentLoader for StaticPages {
    fn load_pages<'a>(
        &'a self,
        _path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PageText>, IndexError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.pages.clone()) })
    }
}

/// Resolves the canonical path for logging and the manifest; falls back to the input.
pub fn display_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
