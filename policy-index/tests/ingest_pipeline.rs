use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use policy_index::persist::IngestLock;
use policy_index::{
    EmbeddingsProvider, IndexConfig, IndexError, NoopProgress, PolicyStore, StaticPages,
    VectorIndex, index_ready,
};

/// Bag-of-words embedder: each lowercase word bumps one of 32 buckets.
struct HashEmbedder {
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl HashEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    fn failing_after(n: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(n),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn bucket(word: &str) -> usize {
    word.bytes()
        .fold(5381usize, |h, b| h.wrapping_mul(33) ^ b as usize)
        % 32
}

impl EmbeddingsProvider for HashEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(IndexError::Config("embedding backend unavailable".into()));
            }
            let mut v = vec![0.0f32; 32];
            for w in text.split_whitespace() {
                let w: String = w
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(char::to_lowercase)
                    .collect();
                if !w.is_empty() {
                    v[bucket(&w)] += 1.0;
                }
            }
            Ok(v)
        })
    }

    fn model_name(&self) -> &str {
        "hash-bow-32"
    }
}

fn policy_pages() -> StaticPages {
    StaticPages::new(vec![
        "Nestlé Human Resources Policy. Introduction and scope of this document.".into(),
        "".into(),
        "Parental leave: employees are entitled to maternity and paternity leave \
         according to local legislation and the minimum standards described here."
            .into(),
        "Flexible working arrangements such as part-time work and remote work \
         may be agreed with the line manager."
            .into(),
        "Remuneration and benefits are reviewed annually against the market.".into(),
    ])
}

fn config(dir: &std::path::Path) -> IndexConfig {
    let mut cfg = IndexConfig::new_default(dir.join("policy_index"), dir.join("policy.pdf"));
    cfg.chunk_size = 80;
    cfg.chunk_overlap = 20;
    cfg.embedding_concurrency = 3;
    cfg
}

#[tokio::test]
async fn ingest_then_load_serves_without_embedding_calls() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let embedder = HashEmbedder::new();

    let (store, report) = PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap();
    assert!(index_ready(&cfg.index_dir));
    assert_eq!(report.pages, 4);
    assert_eq!(report.chunks, embedder.calls());
    assert_eq!(store.manifest().embedding_model, "hash-bow-32");
    // Blank page 2 leaves a gap in numbering.
    assert!(store.index().chunks().all(|c| c.page != 2));

    let reopened = HashEmbedder::new();
    let store = PolicyStore::open_or_ingest(&cfg, &policy_pages(), &reopened, &NoopProgress)
        .await
        .unwrap();
    assert_eq!(reopened.calls(), 0);
    assert_eq!(store.index().len(), report.chunks);
}

#[tokio::test]
async fn open_or_ingest_builds_missing_index() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    std::fs::create_dir_all(&cfg.index_dir).unwrap();
    assert!(!index_ready(&cfg.index_dir));

    let embedder = HashEmbedder::new();
    let store = PolicyStore::open_or_ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap();
    assert!(embedder.calls() > 0);
    assert!(!store.index().is_empty());
}

#[tokio::test]
async fn retrieval_finds_the_relevant_page() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let embedder = HashEmbedder::new();
    let (store, _) = PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap();

    let hits = store
        .retrieve("parental leave maternity paternity", &embedder, 3, None)
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.page, 3);

    let none = store
        .retrieve("parental leave", &embedder, 3, Some(1.01))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn reingestion_is_idempotent_for_retrieval() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let embedder = HashEmbedder::new();
    let query = "remote work with the line manager";

    let (first, _) = PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap();
    let before: Vec<String> = first
        .retrieve(query, &embedder, 4, None)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.chunk.id)
        .collect();

    PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap();
    let second = PolicyStore::load(&cfg.index_dir).unwrap();
    let after: Vec<String> = second
        .retrieve(query, &embedder, 4, None)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.chunk.id)
        .collect();

    assert_eq!(before, after);
}

#[tokio::test]
async fn failed_embedding_leaves_no_index() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let embedder = HashEmbedder::failing_after(2);

    let err = PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Config(_)));
    assert!(!cfg.index_dir.exists());
    assert!(!tmp.path().join("policy_index.lock").exists());
    // Two successes plus at most one full window of in-flight requests.
    assert!(embedder.calls() <= 2 + cfg.embedding_concurrency);
}

#[tokio::test]
async fn embedding_stops_at_first_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path());
    cfg.embedding_concurrency = 1;
    let pages = StaticPages::new(
        (1..=50)
            .map(|i| format!("Policy clause number {i} applies."))
            .collect(),
    );
    let embedder = HashEmbedder::failing_after(0);

    assert!(
        PolicyStore::ingest(&cfg, &pages, &embedder, &NoopProgress)
            .await
            .is_err()
    );
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn failed_rebuild_keeps_previous_index() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let (good, _) = PolicyStore::ingest(&cfg, &policy_pages(), &HashEmbedder::new(), &NoopProgress)
        .await
        .unwrap();

    let failing = HashEmbedder::failing_after(1);
    assert!(
        PolicyStore::ingest(&cfg, &policy_pages(), &failing, &NoopProgress)
            .await
            .is_err()
    );

    let reloaded = PolicyStore::load(&cfg.index_dir).unwrap();
    assert_eq!(reloaded.index().len(), good.index().len());
}

#[tokio::test]
async fn empty_document_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let blank = StaticPages::new(vec!["  ".into(), "\n\n".into()]);

    let err = PolicyStore::ingest(&cfg, &blank, &HashEmbedder::new(), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::EmptyDocument(_)));
    assert!(!cfg.index_dir.exists());
}

#[tokio::test]
async fn concurrent_ingestion_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let _held = IngestLock::acquire(&cfg.index_dir).unwrap();

    let embedder = HashEmbedder::new();
    let err = PolicyStore::ingest(&cfg, &policy_pages(), &embedder, &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::IngestionInProgress(_)));
    assert_eq!(embedder.calls(), 0);
}
