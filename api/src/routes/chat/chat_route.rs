//! POST /chat: answer a question about the HR policy.

use std::{sync::Arc, time::Instant};

use axum::{Json, extract::State, http::StatusCode, response::Response};
use policy_qa::AskOptions;
use tracing::{Instrument, info, info_span};

use crate::{
    core::{app_state::AppState, http::response_envelope::Envelope},
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::{ChatRequest, ChatResponse},
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"How long is paternity leave?","history":[]}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".into()));
    }
    let turns = body.turns();
    let started = Instant::now();
    let span = info_span!("chat", turns = turns.len(), question_chars = message.chars().count());

    let ask = state.assistant.ask(message, &turns, AskOptions::default());
    let result = tokio::time::timeout(state.request_timeout, ask)
        .instrument(span.clone())
        .await
        .map_err(|_| AppError::Timeout(state.request_timeout))??;

    span.in_scope(|| {
        info!(
            pages = ?result.pages,
            sources = result.sources.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "chat answered"
        )
    });
    Ok(Envelope::ok(ChatResponse::from(result)).respond(StatusCode::OK))
}
