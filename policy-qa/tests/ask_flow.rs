use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_llm_service::{AiLlmError, ChatMessage, ChatRole};
use policy_index::{
    EmbeddingsProvider, IndexConfig, IndexError, NoopProgress, PolicyStore, StaticPages,
};
use policy_qa::prompt::{ANSWER_SYSTEM, SEARCH_SYSTEM};
use policy_qa::{
    AskOptions, Assistant, ChatProvider, ConversationTurn, NOT_FOUND_ANSWER, QaConfig, QaError,
    RequestStage,
};

struct HashEmbedder;

impl EmbeddingsProvider for HashEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            let mut v = vec![0.0f32; 32];
            for w in text.split_whitespace() {
                let w: String = w
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect();
                if w.is_empty() {
                    continue;
                }
                let h = w
                    .bytes()
                    .fold(5381usize, |h, b| h.wrapping_mul(33) ^ b as usize);
                v[h % 32] += 1.0;
            }
            // Keep every vector non-zero so cosine is defined.
            v[0] += 0.01;
            Ok(v)
        })
    }

    fn model_name(&self) -> &str {
        "hash-bow-32"
    }
}

type Reply = dyn Fn(&[ChatMessage]) -> Result<String, AiLlmError> + Send + Sync;

/// Records every call and answers through a closure.
struct ScriptedChat {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    reply: Box<Reply>,
}

impl ScriptedChat {
    fn new(
        reply: impl Fn(&[ChatMessage]) -> Result<String, AiLlmError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatProvider for ScriptedChat {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(messages.to_vec());
            (self.reply)(messages)
        })
    }
}

fn is_rewrite(messages: &[ChatMessage]) -> bool {
    messages.first().is_some_and(|m| m.content == SEARCH_SYSTEM)
}

fn last_user(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

async fn store() -> (tempfile::TempDir, Arc<PolicyStore>) {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = IndexConfig::new_default(tmp.path().join("idx"), tmp.path().join("hr.pdf"));
    cfg.chunk_size = 120;
    cfg.chunk_overlap = 20;
    let pages = StaticPages::new(vec![
        "Nestlé Human Resources Policy. Scope and principles.".into(),
        "Employee relations are based on trust, dialogue and respect for freedom of association."
            .into(),
        "Parental leave: mothers receive maternity leave of at least 14 weeks. \
         Fathers receive paternity leave according to local practice."
            .into(),
        "Training and development are shared responsibilities of employees and managers.".into(),
    ]);
    let (store, _) = PolicyStore::ingest(&cfg, &pages, &HashEmbedder, &NoopProgress)
        .await
        .unwrap();
    (tmp, Arc::new(store))
}

fn assistant(store: Arc<PolicyStore>, chat: Arc<ScriptedChat>, cfg: QaConfig) -> Assistant {
    Assistant::new(store, Arc::new(HashEmbedder), chat, cfg)
}

#[tokio::test]
async fn first_question_skips_rewrite_and_cites_retrieved_pages() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|_| {
        Ok("Employee relations rest on trust and dialogue.\n\nSources: p. 2, p. 99".into())
    });
    let qa = assistant(store, chat.clone(), QaConfig::default());

    let r = qa
        .ask("what is the policy on employee relations?", &[], AskOptions::default())
        .await
        .unwrap();

    assert_eq!(r.answer, "Employee relations rest on trust and dialogue.");
    assert_eq!(r.pages, vec![2]);
    assert!(!r.sources.is_empty());

    let calls = chat.calls();
    assert_eq!(calls.len(), 1, "no rewrite call without history");
    assert_eq!(calls[0][0].content, ANSWER_SYSTEM);
    assert!(!last_user(&calls[0]).contains("Standalone query"));
}

#[tokio::test]
async fn unknown_topic_yields_not_found_without_citations() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|_| Ok(format!("{NOT_FOUND_ANSWER}\nSources: p. 1")));
    let qa = assistant(store, chat, QaConfig::default());

    let r = qa
        .ask("what is the policy on interstellar travel?", &[], AskOptions::default())
        .await
        .unwrap();

    assert_eq!(r.answer, NOT_FOUND_ANSWER);
    assert!(r.pages.is_empty());
}

#[tokio::test]
async fn paraphrased_not_found_cites_nothing() {
    let replies = [
        "The HR policy does not mention interstellar travel.\nSources: none",
        "There is no information about interstellar travel in the provided context.",
        "I'm sorry, the policy does not cover that topic.\nSources: p. 2",
    ];
    for reply in replies {
        let (_tmp, store) = store().await;
        let chat = ScriptedChat::new(move |_| Ok(reply.to_string()));
        let qa = assistant(store, chat, QaConfig::default());

        let r = qa
            .ask("what is the policy on interstellar travel?", &[], AskOptions::default())
            .await
            .unwrap();

        assert!(r.pages.is_empty(), "cited {:?} for {reply:?}", r.pages);
        assert!(!r.answer.contains("Sources"));
    }
}

#[tokio::test]
async fn sources_line_without_pages_cites_nothing() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|_| {
        Ok("Leave is agreed with the line manager.\nSources: none".into())
    });
    let qa = assistant(store, chat, QaConfig::default());

    let r = qa
        .ask("how is flexible work agreed?", &[], AskOptions::default())
        .await
        .unwrap();

    assert_eq!(r.answer, "Leave is agreed with the line manager.");
    assert!(r.pages.is_empty());
}

#[tokio::test]
async fn empty_retrieval_short_circuits_the_model() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|_| Ok("should not be called".into()));
    let cfg = QaConfig {
        score_floor: Some(1.5),
        ..QaConfig::default()
    };
    let qa = assistant(store, chat.clone(), cfg);

    let r = qa
        .ask("what is the policy on interstellar travel?", &[], AskOptions::default())
        .await
        .unwrap();

    assert_eq!(r.answer, NOT_FOUND_ANSWER);
    assert!(r.pages.is_empty());
    assert!(r.sources.is_empty());
    assert!(chat.calls().is_empty());
}

#[tokio::test]
async fn follow_up_is_rewritten_with_history() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|msgs| {
        if is_rewrite(msgs) {
            let mentions_topic = msgs.iter().any(|m| m.content.contains("parental leave"));
            let q = if mentions_topic {
                "\"parental leave duration for fathers\""
            } else {
                "how long is it for fathers"
            };
            return Ok(q.into());
        }
        Ok("Fathers receive paternity leave according to local practice.\nSources: p. 3".into())
    });
    let qa = assistant(store, chat.clone(), QaConfig::default());

    let history = vec![ConversationTurn::new(
        "What is the parental leave policy?",
        "Mothers receive at least 14 weeks of maternity leave.",
    )];
    let r = qa
        .ask("How long is it for fathers?", &history, AskOptions::default())
        .await
        .unwrap();

    let calls = chat.calls();
    assert_eq!(calls.len(), 2);
    assert!(is_rewrite(&calls[0]));
    assert_eq!(last_user(&calls[0]), "How long is it for fathers?");

    let answer_prompt = last_user(&calls[1]);
    assert!(answer_prompt.contains("Standalone query: parental leave duration for fathers"));
    assert!(answer_prompt.contains("[Page 3]"));
    assert!(r.answer.contains("paternity"));
    assert_eq!(r.pages, vec![3]);
    // History reaches the answer prompt too.
    assert_eq!(calls[1][1].content, "What is the parental leave policy?");
}

#[tokio::test]
async fn only_recent_history_is_sent() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|msgs| {
        if is_rewrite(msgs) {
            Ok("training".into())
        } else {
            Ok("Training is shared.\nSources: p. 4".into())
        }
    });
    let cfg = QaConfig {
        max_history_turns: 2,
        ..QaConfig::default()
    };
    let qa = assistant(store, chat.clone(), cfg);
    let history: Vec<ConversationTurn> = (0..5)
        .map(|i| ConversationTurn::new(format!("q{i}"), format!("a{i}")))
        .collect();

    qa.ask("and training?", &history, AskOptions::default())
        .await
        .unwrap();

    let rewrite = &chat.calls()[0];
    // system + 2 turns + question
    assert_eq!(rewrite.len(), 6);
    assert_eq!(rewrite[1].content, "q3");
}

#[tokio::test]
async fn failures_report_their_stage() {
    let (_tmp, store) = store().await;
    let history = vec![ConversationTurn::new("hi", "hello")];

    let chat = ScriptedChat::new(|_| Err(AiLlmError::Timeout(Duration::from_secs(60))));
    let qa = assistant(store.clone(), chat, QaConfig::default());
    let err = qa
        .ask("and leave?", &history, AskOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QaError::Rewrite(_)));
    assert_eq!(err.stage(), RequestStage::QueryRewritten);

    let chat = ScriptedChat::new(|msgs| {
        if is_rewrite(msgs) {
            Ok("leave".into())
        } else {
            Err(AiLlmError::Timeout(Duration::from_secs(60)))
        }
    });
    let qa = assistant(store, chat, QaConfig::default());
    let err = qa
        .ask("and leave?", &history, AskOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QaError::Generation(_)));
    assert_eq!(err.stage(), RequestStage::Answered);
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let (_tmp, store) = store().await;
    let chat = ScriptedChat::new(|_| Ok(String::new()));
    let qa = assistant(store, chat.clone(), QaConfig::default());

    let err = qa.ask("   ", &[], AskOptions::default()).await.unwrap_err();
    assert!(matches!(err, QaError::EmptyQuestion));
    assert_eq!(err.stage(), RequestStage::Received);
    assert!(chat.calls().is_empty());
}
