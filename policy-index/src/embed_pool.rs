//! Embedding executor with bounded concurrency and dimension checks.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::{
    embed::EmbeddingsProvider,
    errors::IndexError,
    progress::Progress,
    record::{DocumentChunk, IndexedChunk},
};

/// Embeds every chunk and returns them paired with their vectors, in chunk order.
///
/// - `expected_dim`: if `Some`, enforces this vector size; otherwise the first
///   vector fixes the dimension for the rest.
/// - `concurrency`: maximum number of in-flight embedding requests.
///
/// The first failure stops the stream; queued chunks are not sent.
///
/// # Errors
/// [`IndexError::VectorSizeMismatch`] on inconsistent dimensions, or the provider's error.
pub async fn embed_chunks(
    chunks: Vec<DocumentChunk>,
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
    progress: &dyn Progress,
) -> Result<Vec<IndexedChunk>, IndexError> {
    info!(
        "embed_pool::embed_chunks: total={} concurrency={}",
        chunks.len(),
        concurrency
    );
    progress.set_total(chunks.len() as u64);

    let mut results: Vec<(usize, Vec<f32>)> = stream::iter(chunks.iter().enumerate())
        .map(|(i, c)| async move {
            let v = provider.embed(&c.text).await?;
            progress.step("embedding chunks");
            Ok::<(usize, Vec<f32>), IndexError>((i, v))
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    results.sort_by_key(|(i, _)| *i);

    let mut dim = expected_dim;
    let mut out = Vec::with_capacity(chunks.len());
    for (chunk, (_, v)) in chunks.into_iter().zip(results) {
        let want = *dim.get_or_insert(v.len());
        if v.len() != want || want == 0 {
            return Err(IndexError::VectorSizeMismatch { got: v.len(), want });
        }
        out.push(IndexedChunk {
            chunk,
            embedding: v,
        });
    }

    debug!("embed_pool::embed_chunks: embeddings filled, dim={:?}", dim);
    Ok(out)
}
