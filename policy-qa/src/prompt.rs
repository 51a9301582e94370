//! Prompt builders for the two chat calls: query rewrite and grounded answer.

use ai_llm_service::ChatMessage;
use policy_index::ChunkHit;

use crate::api_types::ConversationTurn;

/// Exact reply expected when the context does not contain the answer.
pub const NOT_FOUND_ANSWER: &str = "I cannot find the answer to that in the HR policy document.";

/// System instructions for turning a follow-up into a standalone query.
pub const SEARCH_SYSTEM: &str = "You are a search assistant for Nestlé HR policies. \
Given the chat history and the latest user question, produce a concise standalone search query \
to find the most relevant passages. Resolve pronouns and references using the history. \
If the question is already specific, return it unchanged. \
Reply with the query only, no quotes and no explanation.";

/// System instructions for answering from retrieved excerpts only.
pub const ANSWER_SYSTEM: &str = "You are an HR assistant answering ONLY from the provided context. \
The context consists of excerpts from Nestlé's HR policy PDF, each labelled with its page.\n\
Requirements:\n\
1) Use only the context. Do not rely on outside knowledge.\n\
2) If the context does not contain the answer, reply exactly: \"I cannot find the answer to that in the HR policy document.\"\n\
3) Do not infer anything about specific individuals or their personal data, and do not give speculative legal or financial advice.\n\
4) Quote exact policy language sparingly when helpful. Keep answers clear, concise, and compliant.\n\
5) End with a line of the form `Sources: p. N, p. M` listing the pages you used.\n";

/// Messages for the rewrite call: system, prior turns, latest question.
pub fn build_rewrite_messages(history: &[ConversationTurn], question: &str) -> Vec<ChatMessage> {
    let mut msgs = Vec::with_capacity(history.len() * 2 + 2);
    msgs.push(ChatMessage::system(SEARCH_SYSTEM));
    push_history(&mut msgs, history);
    msgs.push(ChatMessage::user(question.trim()));
    msgs
}

/// Messages for the answer call.
///
/// The context block lists hits in ranking order as `[Page N]` excerpts and is
/// cut to at most `max_chars` characters. The standalone query is shown only
/// when it differs from the question.
pub fn build_answer_messages(
    history: &[ConversationTurn],
    question: &str,
    standalone_query: &str,
    hits: &[ChunkHit],
    max_chars: usize,
) -> Vec<ChatMessage> {
    let mut msgs = Vec::with_capacity(history.len() * 2 + 2);
    msgs.push(ChatMessage::system(ANSWER_SYSTEM));
    push_history(&mut msgs, history);

    let question = question.trim();
    let mut user = format!("Question: {question}\n");
    let query = standalone_query.trim();
    if !query.is_empty() && query != question {
        user.push_str(&format!("Standalone query: {query}\n"));
    }
    user.push_str("\nContext:\n");
    user.push_str(&build_context(hits, max_chars));
    user.push_str("\nProvide the best possible answer now.");
    msgs.push(ChatMessage::user(user));
    msgs
}

/// `[Page N]` labelled excerpts within a character budget, preserving rank order.
pub fn build_context(hits: &[ChunkHit], max_chars: usize) -> String {
    let mut out = String::new();
    let mut budget = max_chars;

    for h in hits {
        let header = format!("[Page {}]\n", h.chunk.page);
        let header_len = header.chars().count();
        if header_len >= budget {
            break;
        }
        let text = h.chunk.text.trim();
        let text_len = text.chars().count();

        out.push_str(&header);
        budget -= header_len;

        // Leave room for the trailing newlines.
        let take = budget.saturating_sub(2);
        if text_len > take {
            out.extend(text.chars().take(take));
            out.push_str("\n…\n");
            break;
        }
        out.push_str(text);
        out.push_str("\n\n");
        budget = budget.saturating_sub(text_len + 2);
    }

    out
}

fn push_history(msgs: &mut Vec<ChatMessage>, history: &[ConversationTurn]) {
    for t in history {
        if !t.question.trim().is_empty() {
            msgs.push(ChatMessage::user(t.question.trim()));
        }
        if !t.answer.trim().is_empty() {
            msgs.push(ChatMessage::assistant(t.answer.trim()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::ChatRole;
    use policy_index::DocumentChunk;

    fn hit(page: u32, text: &str) -> ChunkHit {
        ChunkHit {
            score: 0.9,
            chunk: DocumentChunk {
                id: format!("p{page}"),
                seq: page as usize,
                page,
                text: text.into(),
                source: "HR".into(),
            },
        }
    }

    #[test]
    fn rewrite_messages_carry_history_in_order() {
        let history = vec![ConversationTurn::new("What is the parental leave policy?", "It covers ...")];
        let msgs = build_rewrite_messages(&history, "How long is it for fathers?");
        let roles: Vec<ChatRole> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(msgs[3].content, "How long is it for fathers?");
    }

    #[test]
    fn context_labels_pages_and_respects_budget() {
        let hits = vec![hit(4, &"a".repeat(70)), hit(9, &"b".repeat(50))];
        let ctx = build_context(&hits, 80);
        assert!(ctx.starts_with("[Page 4]\n"));
        assert!(ctx.ends_with("…\n"));
        assert!(ctx.chars().count() <= 82);
        assert!(!ctx.contains("[Page 9]"));

        let both = build_context(&hits, 1000);
        assert!(both.contains("[Page 9]"));
    }

    #[test]
    fn answer_prompt_shows_query_only_when_rewritten() {
        let hits = vec![hit(2, "Maternity leave is 14 weeks.")];
        let same = build_answer_messages(&[], "leave?", "leave?", &hits, 1000);
        assert!(!same.last().unwrap().content.contains("Standalone query"));

        let diff = build_answer_messages(&[], "fathers?", "paternity leave duration", &hits, 1000);
        let user = &diff.last().unwrap().content;
        assert!(user.contains("Standalone query: paternity leave duration"));
        assert!(user.contains("[Page 2]\nMaternity leave is 14 weeks."));
        assert!(diff[0].content.contains("Sources:"));
    }
}
