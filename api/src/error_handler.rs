use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use policy_qa::QaError;
use thiserror::Error;
use tracing::error;

use crate::core::{
    app_state::ConfigError,
    http::response_envelope::{Envelope, ErrorBody},
};

const APOLOGY: &str =
    "Sorry, I could not complete your request right now. Please try again in a moment.";
const TIMEOUT_APOLOGY: &str =
    "Sorry, answering took too long. Please try again or rephrase your question.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request exceeded {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Qa(QaError),
}

impl From<QaError> for AppError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::EmptyQuestion => AppError::BadRequest("message must not be empty".into()),
            other => AppError::Qa(other),
        }
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Qa(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Qa(_) => "GENERATION_FAILED",
        }
    }

    /// Text shown to the user. Upstream detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Timeout(_) => TIMEOUT_APOLOGY.into(),
            _ => APOLOGY.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Qa(e) => error!(stage = %e.stage(), error = %e, "request failed"),
            AppError::BadRequest(_) => {}
            other => error!(error = %other, "request failed"),
        }
        Envelope::failure(ErrorBody::new(self.error_code(), self.public_message())).respond(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
