use policy_qa::{AnswerResult, ConversationTurn, SourceRef};
use serde::{Deserialize, Serialize};

/// Request payload for /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's latest question.
    pub message: String,
    /// Earlier messages of the conversation, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

/// One chat message as kept by the browser.
#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatRequest {
    /// Pairs `user`/`assistant` messages into turns; other roles are ignored.
    pub fn turns(&self) -> Vec<ConversationTurn> {
        let mut turns: Vec<ConversationTurn> = Vec::new();
        let mut open = false;
        for m in &self.history {
            match m.role.trim().to_ascii_lowercase().as_str() {
                "user" | "human" => {
                    turns.push(ConversationTurn::new(m.content.clone(), String::new()));
                    open = true;
                }
                "assistant" | "ai" => match turns.last_mut() {
                    Some(t) if open => {
                        t.answer = m.content.clone();
                        open = false;
                    }
                    _ => turns.push(ConversationTurn::new(String::new(), m.content.clone())),
                },
                _ => {}
            }
        }
        turns
    }
}

/// Response payload for /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Distinct cited pages, ascending.
    pub pages: Vec<u32>,
    pub sources: Vec<SourceRef>,
}

impl From<AnswerResult> for ChatResponse {
    fn from(r: AnswerResult) -> Self {
        Self {
            answer: r.answer,
            pages: r.pages,
            sources: r.sources,
        }
    }
}
