//! Rebuilds the policy index from the source PDF.
//!
//! ```text
//! ingest [PATH_TO_PDF]
//! ```
//! The path defaults to `SOURCE_PDF`; the index goes to `INDEX_DIR`.

use std::{error::Error, path::PathBuf, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_openai_chat, config_openai_embedding},
    telemetry,
};
use policy_index::{IndexConfig, IndicatifProgress, OpenAiEmbedder, PdfLoader, PolicyStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dotenv = dotenvy::dotenv();
    telemetry::init("info")?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    let mut cfg = IndexConfig::from_env()?;
    if let Some(pdf) = std::env::args_os().nth(1) {
        cfg.source_pdf = PathBuf::from(pdf);
    }

    let svc = Arc::new(LlmServiceProfiles::new(
        config_openai_chat()?,
        config_openai_embedding()?,
    )?);
    let embedder = OpenAiEmbedder::new(svc, cfg.embedding_dim);

    let progress = IndicatifProgress::bar();
    let (_, report) = PolicyStore::ingest(&cfg, &PdfLoader, &embedder, &progress).await?;

    info!(
        index_dir = %cfg.index_dir.display(),
        pages = report.pages,
        chunks = report.chunks,
        dim = report.dimension,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "index rebuilt"
    );
    Ok(())
}
