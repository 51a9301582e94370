//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::Serialize;

/// One completed exchange of a conversation.
///
/// History is owned by the caller; the assistant only reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    /// May be empty when the caller only recorded the question.
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Per-request overrides.
///
/// Setting a field to `0` means: "use the value from env-config".
///
/// # Example
/// ```
/// use policy_qa::AskOptions;
/// let opts = AskOptions { top_k: 8, ..Default::default() };
/// assert_eq!(opts.max_ctx_chars, 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct AskOptions {
    /// Chunks to retrieve. If `0`, falls back to `RAG_TOP_K`.
    pub top_k: usize,
    /// Context budget in characters. If `0`, falls back to `MAX_CTX_CHARS`.
    pub max_ctx_chars: usize,
}

/// A retrieved excerpt shown to the user next to the answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceRef {
    pub page: u32,
    pub source: String,
    /// First characters of the chunk text.
    pub preview: String,
}

/// Final answer with its citations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    /// Distinct cited pages, ascending. Empty for a not-found answer.
    pub pages: Vec<u32>,
    /// Retrieved excerpts in ranking order.
    pub sources: Vec<SourceRef>,
}

/// Lifecycle of a single question.
///
/// `received` → `query-rewritten` → `retrieved` → `answered` → `returned`.
/// A failure is reported together with the stage that was being attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStage {
    Received,
    QueryRewritten,
    Retrieved,
    Answered,
    Returned,
}

impl RequestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::QueryRewritten => "query-rewritten",
            Self::Retrieved => "retrieved",
            Self::Answered => "answered",
            Self::Returned => "returned",
        }
    }
}

impl std::fmt::Display for RequestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
