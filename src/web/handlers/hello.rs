use axum::response::Json;
use serde_json::{json, Value};

/// Liveness greeting with the server-local time
pub async fn hello() -> Json<Value> {
    Json(json!({
        "message": "Hello! This is your first API!",
        "time": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}
