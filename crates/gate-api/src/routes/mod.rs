//! API routes

mod auth;
mod chat;
mod health;
mod image;
pub mod metrics;
pub mod types;


use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
};
use gate_auth::{require_authenticated, session_middleware};
use std::sync::Arc;

use crate::rate_limit::rate_limit_middleware;
use crate::state::{AppState, MetricsHandle};

/// Request bodies are small JSON documents
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    // Authentication is checked before any body extraction
    let protected = Router::new()
        .merge(chat::routes())
        .merge(image::routes())
        .route_layer(from_fn(require_authenticated));

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected)
        .with_state(state.clone())
        .layer(from_fn_with_state(state.auth.clone(), session_middleware))
        .layer(from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
