//! Application error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again shortly (rate limit)";
pub const SAFETY_MESSAGE: &str =
    "The content was blocked by the safety policy, please try rephrasing the request";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("API key missing")]
    MissingCredential,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    Conflict(String),
}

impl AppError {
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            // Every relay failure before streaming surfaces as a server error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user, with known provider failures reworded
    pub fn user_message(&self) -> String {
        friendly_message(&self.to_string())
    }
}

pub fn friendly_message(raw: &str) -> String {
    if raw.contains("SAFETY") {
        SAFETY_MESSAGE.to_string()
    } else if raw.contains("429") {
        RATE_LIMIT_MESSAGE.to_string()
    } else {
        raw.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_reworded() {
        let err = AppError::provider(429, "[429 Too Many Requests] Resource has been exhausted");
        assert_eq!(err.user_message(), RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn test_safety_takes_precedence() {
        assert_eq!(friendly_message("429 ... finishReason SAFETY"), SAFETY_MESSAGE);
    }

    #[test]
    fn test_other_messages_pass_through() {
        let err = AppError::provider(400, "[400 Bad Request] model not found");
        assert_eq!(err.user_message(), "[400 Bad Request] model not found");
        assert_eq!(AppError::MissingCredential.user_message(), "API key missing");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MissingCredential.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::InvalidRequest("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::SessionNotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadInput("x".into()).status(), StatusCode::BAD_REQUEST);
    }
}
