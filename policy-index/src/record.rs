//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Text extracted from one PDF page. `page` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// A span of page text, the unit of retrieval. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable id derived from source label, page and sequence.
    pub id: String,
    /// Position of the chunk in document order (0-based).
    pub seq: usize,
    /// 1-based page the text came from.
    pub page: u32,
    pub text: String,
    pub source: String,
}

/// A chunk together with its embedding, as stored in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexedChunk {
    #[serde(flatten)]
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// A single retrieval hit.
#[derive(Clone, Debug)]
pub struct ChunkHit {
    /// Similarity score; higher is closer for every distance kind.
    pub score: f32,
    pub chunk: DocumentChunk,
}

/// Clamp text to at most `max_chars` characters on a char boundary, appending `…` when cut.
pub fn clamp_preview(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_chunk_is_flat_on_disk() {
        let row = IndexedChunk {
            chunk: DocumentChunk {
                id: "a".into(),
                seq: 3,
                page: 2,
                text: "Employees are entitled".into(),
                source: "HR".into(),
            },
            embedding: vec![0.5, 0.25],
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["page"], 2);
        assert_eq!(v["seq"], 3);
        assert_eq!(v["embedding"][1], 0.25);
    }

    #[test]
    fn preview_respects_multibyte_chars() {
        assert_eq!(clamp_preview("  Nestlé  ", 10), "Nestlé");
        assert_eq!(clamp_preview("Nestlé policy", 6), "Nestlé…");
    }
}
