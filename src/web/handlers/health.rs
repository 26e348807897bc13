//! Health check endpoint

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let sessions = state.sessions.read().await.count();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "ai-workstation",
            "version": env!("CARGO_PKG_VERSION"),
            "credential_configured": state.config.has_credential(),
            "sessions": sessions,
        })),
    )
}
