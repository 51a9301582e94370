//! In-memory vector index with exact nearest-neighbour search.
//!
//! The policy document yields a few hundred chunks at most, so a linear scan
//! is exact and fast enough; no ANN structure is needed.

use std::cmp::Ordering;

use crate::config::DistanceKind;
use crate::errors::IndexError;
use crate::record::{ChunkHit, DocumentChunk, IndexedChunk};

/// Read-only nearest-neighbour lookup over chunk embeddings.
pub trait VectorIndex: Send + Sync {
    /// Returns up to `top_k` chunks ordered by descending score.
    ///
    /// Ties are broken by chunk sequence so results are reproducible.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ChunkHit>, IndexError>;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension.
    fn dimension(&self) -> usize;
}

/// Brute-force index over a flat list of chunks.
#[derive(Clone, Debug)]
pub struct FlatIndex {
    entries: Vec<IndexedChunk>,
    /// Cached L2 norms, parallel to `entries`.
    norms: Vec<f32>,
    dim: usize,
    distance: DistanceKind,
}

impl FlatIndex {
    /// Builds an index, checking that every vector has the same dimension.
    ///
    /// # Errors
    /// - [`IndexError::Config`] if `entries` is empty
    /// - [`IndexError::VectorSizeMismatch`] on inconsistent dimensions
    pub fn from_entries(
        mut entries: Vec<IndexedChunk>,
        distance: DistanceKind,
    ) -> Result<Self, IndexError> {
        let dim = entries
            .first()
            .map(|e| e.embedding.len())
            .ok_or_else(|| IndexError::Config("cannot build an index without chunks".into()))?;
        if dim == 0 {
            return Err(IndexError::VectorSizeMismatch { got: 0, want: 1 });
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dim) {
            return Err(IndexError::VectorSizeMismatch {
                got: bad.embedding.len(),
                want: dim,
            });
        }

        entries.sort_by_key(|e| e.chunk.seq);
        let norms = entries.iter().map(|e| l2_norm(&e.embedding)).collect();

        Ok(Self {
            entries,
            norms,
            dim,
            distance,
        })
    }

    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Iterates over stored chunks in document order.
    pub fn chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Number of distinct pages covered by the index.
    pub fn page_count(&self) -> usize {
        let mut pages: Vec<u32> = self.chunks().map(|c| c.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages.len()
    }

    fn score(&self, query: &[f32], query_norm: f32, idx: usize) -> f32 {
        let v = &self.entries[idx].embedding;
        match self.distance {
            DistanceKind::Dot => dot(query, v),
            DistanceKind::Cosine => {
                let denom = query_norm * self.norms[idx];
                if denom == 0.0 { 0.0 } else { dot(query, v) / denom }
            }
            DistanceKind::Euclid => {
                let d: f32 = query
                    .iter()
                    .zip(v)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    .sqrt();
                -d
            }
        }
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ChunkHit>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::VectorSizeMismatch {
                got: query.len(),
                want: self.dim,
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let qn = l2_norm(query);
        let mut scored: Vec<(f32, usize)> = (0..self.entries.len())
            .map(|i| (self.score(query, qn, i), i))
            .filter(|(s, _)| s.is_finite())
            .collect();

        // entries are sorted by seq, so index order == seq order for ties.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, i)| ChunkHit {
                score,
                chunk: self.entries[i].chunk.clone(),
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
