//! Image generation route

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use gate_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{ImageRequest, ImageResponse};

/// POST /generate-image
async fn generate_image(
    State(state): State<AppState>,
    request: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let Json(request) = request?;

    let result = state.completions.generate_image(request.prompt.as_deref()).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(CoreError::InvalidInput(_)) => "rejected",
        Err(_) => "upstream_error",
    };
    metrics::counter!(
        "llm_gate_upstream_requests_total",
        "endpoint" => "image",
        "outcome" => outcome
    )
    .increment(1);

    Ok(Json(ImageResponse { image_url: result? }))
}

/// Create image routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/generate-image", post(generate_image))
}
