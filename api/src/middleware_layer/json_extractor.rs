//! Rewrites axum's plain-text extractor rejections into the JSON envelope.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::core::http::response_envelope::{Envelope, ErrorBody};

/// Upper bound for a rejection body; they are one-line messages.
const MAX_REJECTION_BYTES: usize = 16 * 1024;

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_REJECTION_BYTES)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn rejected_field(msg: &str) -> Option<String> {
    for key in ["message", "history", "role", "content"] {
        if msg.contains(&format!("`{key}`")) {
            return Some(key.to_string());
        }
    }
    None
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(v) = HeaderValue::from_str(&id) {
        parts.headers.insert("X-Request-Id", v);
    }
    id
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    let code = match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        _ => return res,
    };

    let (mut parts, bytes) = take_body(res).await;
    // Handlers already answer with an envelope.
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    let req_id = ensure_request_id(&mut parts);
    debug!(request_id = %req_id, status = %status, rejection = %original.trim(), "request rejected");

    let hint = if original.contains("missing field `message`") {
        Some("Send a JSON object like {\"message\": \"your question\"}.".into())
    } else if original.contains("expected a sequence") {
        Some("`history` must be an array of {\"role\", \"content\"} objects.".into())
    } else if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        Some("Set `Content-Type: application/json`.".into())
    } else {
        None
    };

    let envelope = Envelope::failure(
        ErrorBody::new(code, original.trim())
            .field(rejected_field(&original))
            .hint(hint)
            .request_id(req_id),
    );
    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
