//! Model listing endpoint

use crate::services::provider::models::{is_error_listing, ModelList};
use crate::state::AppState;
use crate::types::AppError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

pub async fn list_models(State(state): State<AppState>) -> Result<Response, AppError> {
    let listing = state.relay.list_models().await?;

    // Provider-reported errors are passed through untouched
    if is_error_listing(&listing) {
        tracing::warn!("Model listing rejected by provider");
        return Ok((StatusCode::BAD_REQUEST, Json(listing)).into_response());
    }

    let models = ModelList::from_listing(listing)?;
    tracing::debug!("Listing {} generation models", models.count);
    Ok(Json(models).into_response())
}
