//! Ошибки HTTP-слоя и их преобразование в JSON-ответ.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::layout::editor::{PromptError, UnknownSeat};
use crate::services::upstream::UpstreamError;

/// Тело ответа с ошибкой.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("editor session {0} not found")]
    SessionNotFound(Uuid),
    #[error("editor session {0} is being submitted")]
    SessionBusy(Uuid),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    UnknownSeat(#[from] UnknownSeat),
    #[error("venue backend unavailable: {0}")]
    Upstream(#[from] UpstreamError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            AppError::SessionBusy(_) => (StatusCode::CONFLICT, "SESSION_SUBMITTING"),
            AppError::UnknownSeat(_) | AppError::Prompt(PromptError::UnknownSeat(_)) => {
                (StatusCode::NOT_FOUND, "SEAT_NOT_FOUND")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED"),
            AppError::Prompt(PromptError::InvalidIdentifier(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_IDENTIFIER")
            }
            AppError::Prompt(_) => (StatusCode::CONFLICT, "PROMPT_STATE"),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = ApiError {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
