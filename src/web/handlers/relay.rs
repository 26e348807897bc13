//! Stream Relay endpoint

use crate::state::AppState;
use crate::types::{AppError, RelayRequest};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};

/// Relay provider text verbatim as it arrives. Failures before the first
/// chunk (including in-band blocks) become a JSON 500; failures after it
/// abort the body stream.
pub async fn chat_gemini(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let stream = state.relay.open(request).await?;

    let body = stream
        .inspect_err(|e| tracing::error!("Relay stream failed mid-flight: {}", e))
        .map_ok(Bytes::from);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(body.boxed()),
    )
        .into_response())
}
