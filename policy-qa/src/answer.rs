//! Grounded answer generation and citation post-processing.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use policy_index::{ChunkHit, clamp_preview};
use tracing::{debug, info};

use crate::api_types::{AnswerResult, ConversationTurn, SourceRef};
use crate::error::QaError;
use crate::llm::ChatProvider;
use crate::prompt::{NOT_FOUND_ANSWER, build_answer_messages};

/// Phrases that mark a model reply as "the document doesn't say".
const NOT_FOUND_MARKERS: [&str; 22] = [
    "cannot find",
    "can't find",
    "could not find",
    "couldn't find",
    "unable to find",
    "not found in",
    "does not mention",
    "doesn't mention",
    "not mentioned",
    "does not contain",
    "doesn't contain",
    "does not cover",
    "doesn't cover",
    "not covered",
    "does not address",
    "doesn't address",
    "does not specify",
    "doesn't specify",
    "not specified",
    "no information",
    "no mention",
    "not provided in",
];

/// Replies longer than this are treated as real answers even if they contain a marker.
const NOT_FOUND_MAX_CHARS: usize = 240;

/// Calls the chat model once per question and turns its reply into an [`AnswerResult`].
#[derive(Clone)]
pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
    preview_chars: usize,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatProvider>, preview_chars: usize) -> Self {
        Self {
            chat,
            preview_chars,
        }
    }

    /// Answers from `hits` only.
    ///
    /// With no hits the canonical not-found answer is returned without a model call.
    pub async fn answer(
        &self,
        history: &[ConversationTurn],
        question: &str,
        standalone_query: &str,
        hits: &[ChunkHit],
        max_ctx_chars: usize,
    ) -> Result<AnswerResult, QaError> {
        if hits.is_empty() {
            debug!("no context retrieved, answering not-found");
            return Ok(not_found());
        }

        let messages =
            build_answer_messages(history, question, standalone_query, hits, max_ctx_chars);
        let started = Instant::now();
        let raw = self
            .chat
            .complete(&messages)
            .await
            .map_err(QaError::Generation)?;
        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            chars = raw.len(),
            "answer generated"
        );

        Ok(self.finish(&raw, hits))
    }

    fn finish(&self, raw: &str, hits: &[ChunkHit]) -> AnswerResult {
        let sources = hits
            .iter()
            .map(|h| SourceRef {
                page: h.chunk.page,
                source: h.chunk.source.clone(),
                preview: clamp_preview(&h.chunk.text, self.preview_chars),
            })
            .collect();

        let (body, model_pages) = split_sources(raw);
        if body.trim().is_empty() || is_not_found(&body) {
            return AnswerResult {
                answer: if body.trim().is_empty() {
                    NOT_FOUND_ANSWER.to_string()
                } else {
                    body
                },
                pages: Vec::new(),
                sources,
            };
        }

        let pages = match model_pages {
            // `Sources: none` and the like
            Some(p) if p.is_empty() => Vec::new(),
            Some(p) => cite_pages(&p, hits),
            None => cite_pages(&[], hits),
        };
        AnswerResult {
            answer: body,
            pages,
            sources,
        }
    }
}

/// The answer returned when nothing relevant was retrieved.
pub fn not_found() -> AnswerResult {
    AnswerResult {
        answer: NOT_FOUND_ANSWER.to_string(),
        pages: Vec::new(),
        sources: Vec::new(),
    }
}

/// True if the reply says the document does not contain the answer.
pub fn is_not_found(answer: &str) -> bool {
    let a = answer.trim().to_lowercase();
    let canonical = NOT_FOUND_ANSWER.trim_end_matches('.').to_lowercase();
    if a.starts_with(&canonical) {
        return true;
    }
    a.chars().count() <= NOT_FOUND_MAX_CHARS && NOT_FOUND_MARKERS.iter().any(|m| a.contains(m))
}

/// Pages the model cited that were actually retrieved, or every retrieved
/// page when the model cited none of them. Distinct and ascending.
pub fn cite_pages(model_pages: &[u32], hits: &[ChunkHit]) -> Vec<u32> {
    let retrieved: BTreeSet<u32> = hits.iter().map(|h| h.chunk.page).collect();
    let cited: BTreeSet<u32> = model_pages
        .iter()
        .copied()
        .filter(|p| retrieved.contains(p))
        .collect();
    if cited.is_empty() {
        retrieved.into_iter().collect()
    } else {
        cited.into_iter().collect()
    }
}

/// Splits a trailing `Sources` section off the reply.
///
/// Returns the answer text without the section and, when a section was
/// present, the page numbers listed in it. The section starts at the last line
/// whose first word is `Sources` or `Source` (optionally bold or a heading)
/// and runs to the end.
pub fn split_sources(raw: &str) -> (String, Option<Vec<u32>>) {
    let lines: Vec<&str> = raw.lines().collect();
    let Some(start) = lines.iter().rposition(|l| is_sources_header(l)) else {
        return (raw.trim().to_string(), None);
    };

    let section = lines[start..].join("\n");
    let body = lines[..start].join("\n").trim().to_string();
    (body, Some(parse_pages(&section)))
}

fn is_sources_header(line: &str) -> bool {
    strip_header(&line.to_ascii_lowercase()).is_some()
}

/// Drops the leading `Sources:` word; `None` if the line does not start with it.
fn strip_header(line: &str) -> Option<&str> {
    let l = line.trim().trim_start_matches(['#', '*', '_', '-', ' ']);
    let rest = l
        .strip_prefix("sources")
        .or_else(|| l.strip_prefix("source"))?;
    let rest = rest.trim_start_matches(['*', '_', ' ']);
    (rest.is_empty() || rest.starts_with([':', '('])).then_some(rest)
}

/// Extracts page numbers from text like `p. 3, pp. 5-6, page 12` or `3, 5`.
///
/// Each list item must be a page number or a short range, optionally behind a
/// page marker. Parenthesised text and anything else (`section 4.2`, `none`)
/// is ignored.
fn parse_pages(section: &str) -> Vec<u32> {
    let flat = strip_parenthesized(&section.to_lowercase());
    let mut pages = Vec::new();

    for line in flat.lines() {
        let line = strip_header(line).unwrap_or(line);
        let line = line.trim_start_matches([':', ' ']);
        for item in line
            .split([',', ';', '&'])
            .flat_map(|part| part.split(" and "))
        {
            pages.extend(parse_item(item));
        }
    }

    pages.retain(|p| *p > 0);
    pages
}

fn parse_item(item: &str) -> Vec<u32> {
    const MAX_RANGE: u32 = 20;
    const MARKERS: [&str; 6] = ["pages", "page", "pp.", "pp", "p.", "p"];

    let item = item
        .trim()
        .trim_start_matches(['-', '*', '•', '[', ' '])
        .trim_end_matches([']', '.', ' ']);
    let rest = MARKERS
        .iter()
        .find_map(|m| item.strip_prefix(m))
        .unwrap_or(item)
        .trim();

    let number = |s: &str| -> Option<u32> {
        let s = s.trim();
        (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse().ok())
            .flatten()
    };

    if let Some(n) = number(rest) {
        return vec![n];
    }
    let Some((a, b)) = rest.split_once(['-', '–']) else {
        return Vec::new();
    };
    match (number(a), number(b)) {
        (Some(a), Some(b)) if b > a && b - a <= MAX_RANGE => (a..=b).collect(),
        (Some(a), Some(b)) => vec![a, b],
        _ => Vec::new(),
    }
}

fn strip_parenthesized(s: &str) -> String {
    let mut depth = 0usize;
    s.chars()
        .filter_map(|c| match c {
            '(' => {
                depth += 1;
                None
            }
            ')' => {
                depth = depth.saturating_sub(1);
                Some(' ')
            }
            _ if depth > 0 => None,
            _ => Some(c),
        })
        .collect()
}
