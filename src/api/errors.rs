use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::ChessError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(String),
    IllegalMove(String),
    InvalidFen(String),
    InvalidRequest(String),
    GameOver(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session not found: {id}"),
            ),
            ApiError::IllegalMove(msg) => (StatusCode::BAD_REQUEST, "ILLEGAL_MOVE", msg),
            ApiError::InvalidFen(msg) => (StatusCode::BAD_REQUEST, "INVALID_FEN", msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::GameOver(msg) => (
                StatusCode::BAD_REQUEST,
                "GAME_OVER",
                format!("Game is already over: {msg}"),
            ),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        match err {
            ChessError::IllegalMove(_) => ApiError::IllegalMove(err.to_string()),
            ChessError::InvalidFen(_) => ApiError::InvalidFen(err.to_string()),
            ChessError::GameOver(status) => ApiError::GameOver(status),
        }
    }
}
