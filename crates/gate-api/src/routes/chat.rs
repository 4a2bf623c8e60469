//! Chat completion proxy routes

use axum::{
    Json, Router,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use gate_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{ChatBody, ChatQuery};

/// Relay the upstream body untouched
fn upstream_json(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn record_outcome(endpoint: &'static str, result: &Result<Bytes, CoreError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(CoreError::Upstream(_)) => "upstream_error",
        Err(_) => "rejected",
    };
    metrics::counter!(
        "llm_gate_upstream_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

/// GET /chat-completion?request=...&secret=...
async fn chat_from_query(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    let result = state
        .completions
        .chat_from_prompt(query.request.as_deref(), query.secret.as_deref())
        .await;
    record_outcome("chat", &result);

    Ok(upstream_json(result?))
}

/// POST /chat-completion
async fn chat_from_body(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;

    let result = state
        .completions
        .chat_from_messages(body.messages, body.secret.as_deref())
        .await;
    record_outcome("chat", &result);

    Ok(upstream_json(result?))
}

/// Create chat routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/chat-completion", get(chat_from_query).post(chat_from_body))
}
