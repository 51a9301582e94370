use std::{error::Error, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_openai_chat, config_openai_embedding},
    telemetry,
};
use api::{AppState, ServerConfig};
use policy_index::{IndexConfig, NoopProgress, OpenAiEmbedder, PdfLoader, PolicyStore};
use policy_qa::{Assistant, OpenAiChat, QaConfig};
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the environment may come from the deployment.
    let dotenv = dotenvy::dotenv();

    telemetry::init("info")?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    let server_cfg = ServerConfig::from_env()?;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(n) = server_cfg.worker_threads {
        builder.worker_threads(n);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(serve(server_cfg))
}

async fn serve(server_cfg: ServerConfig) -> Result<(), Box<dyn Error>> {
    let svc = Arc::new(LlmServiceProfiles::new(
        config_openai_chat()?,
        config_openai_embedding()?,
    )?);

    let index_cfg = IndexConfig::from_env()?;
    let embedder = Arc::new(OpenAiEmbedder::new(svc.clone(), index_cfg.embedding_dim));
    let store =
        PolicyStore::open_or_ingest(&index_cfg, &PdfLoader, embedder.as_ref(), &NoopProgress)
            .await?;

    let qa_cfg = QaConfig::from_env()?;
    info!(
        chunks = store.manifest().chunk_count,
        pages = store.manifest().page_count,
        top_k = qa_cfg.top_k,
        "assistant ready"
    );
    let assistant = Assistant::new(
        Arc::new(store),
        embedder,
        Arc::new(OpenAiChat::new(svc)),
        qa_cfg,
    );

    let state = AppState::new(Arc::new(assistant), server_cfg.request_timeout);
    api::start(state, &server_cfg).await?;

    Ok(())
}
