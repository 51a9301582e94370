//! GET /health: index summary for probes.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::Envelope};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub chunks: usize,
    pub pages: usize,
    pub embedding_model: String,
    pub source: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let m = state.assistant.store().manifest();
    Envelope::ok(HealthResponse {
        status: "ok",
        chunks: m.chunk_count,
        pages: m.page_count,
        embedding_model: m.embedding_model.clone(),
        source: m.source_label.clone(),
    })
    .respond(StatusCode::OK)
}
