//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator that occurs in it (`"\n\n"`, then
//! `"\n"`, then `" "`, then between characters). Pieces that are still longer
//! than `chunk_size` are split again with the next separator; short pieces
//! are merged back together greedily. Consecutive chunks share up to
//! `chunk_overlap` characters so a sentence cut at a boundary stays
//! retrievable from either side.
//!
//! All lengths are counted in `char`s, not bytes.

use std::collections::VecDeque;

use tracing::debug;

use crate::record::{DocumentChunk, PageText};

/// Default separator cascade.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits page text into overlapping chunks.
#[derive(Clone, Debug)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`; `chunk_size` of 0 is treated as 1.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split a single text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let seps: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &seps)
    }

    /// Split every page independently so chunks never straddle pages.
    ///
    /// Sequence numbers run across the whole document in page order.
    pub fn split_pages(&self, pages: &[PageText], source: &str) -> Vec<DocumentChunk> {
        let mut out = Vec::new();
        for p in pages {
            for text in self.split_text(&p.text) {
                let seq = out.len();
                out.push(DocumentChunk {
                    id: chunk_id(source, p.page, seq),
                    seq,
                    page: p.page,
                    text,
                    source: source.to_string(),
                });
            }
        }
        debug!(
            pages = pages.len(),
            chunks = out.len(),
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "split_pages"
        );
        out
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches.
        let (idx, sep) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map(|(i, s)| (i, *s))
            .unwrap_or((separators.len(), ""));
        let rest = separators.get(idx + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if sep.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(sep).filter(|p| !p.is_empty()).collect()
        };

        let mut out = Vec::new();
        let mut good: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                out.extend(self.merge(&good, sep));
                good.clear();
            }
            if rest.is_empty() {
                out.push(piece.trim().to_string());
            } else {
                out.extend(self.split_recursive(piece, rest));
            }
        }
        if !good.is_empty() {
            out.extend(self.merge(&good, sep));
        }
        out.retain(|c| !c.is_empty());
        out
    }

    /// Greedily joins pieces with `sep` into chunks of at most `chunk_size`,
    /// carrying a tail of at most `chunk_overlap` into the next chunk.
    fn merge(&self, pieces: &[&str], sep: &str) -> Vec<String> {
        let sep_len = char_len(sep);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joined = |cur: &VecDeque<&str>| if cur.is_empty() { 0 } else { sep_len };

            if total + len + joined(&current) > self.chunk_size {
                if !current.is_empty() {
                    push_joined(&mut docs, &current, sep);

                    while total > self.chunk_overlap
                        || (total > 0 && total + len + joined(&current) > self.chunk_size)
                    {
                        let Some(front) = current.pop_front() else {
                            break;
                        };
                        total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                    }
                }
            }

            total += len + joined(&current);
            current.push_back(piece);
        }

        push_joined(&mut docs, &current, sep);
        docs
    }
}

fn push_joined(docs: &mut Vec<String>, current: &VecDeque<&str>, sep: &str) {
    let doc = current.iter().copied().collect::<Vec<_>>().join(sep);
    let doc = doc.trim();
    if !doc.is_empty() {
        docs.push(doc.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Deterministic chunk id: re-ingesting the same document yields the same ids.
pub fn chunk_id(source: &str, page: u32, seq: usize) -> String {
    let key = format!("{source}#p{page}#c{seq}");
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, key.as_bytes()).to_string()
}
