//! Login and logout routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use gate_auth::SessionHandle;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, MessageResponse};

/// POST /login
async fn login(
    State(state): State<AppState>,
    session: SessionHandle,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = request?;

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::InvalidInput(
            "Username and password are required".to_string(),
        ));
    };

    debug!("Login attempt for user: {}", username);

    match state.auth.login(&session, &username, &password).await {
        Ok(user) => {
            metrics::counter!("llm_gate_logins_total", "outcome" => "success").increment(1);
            Ok(Json(LoginResponse {
                message: "Logged in".to_string(),
                username: user.username,
            }))
        }
        Err(e) => {
            metrics::counter!("llm_gate_logins_total", "outcome" => "failure").increment(1);
            Err(e.into())
        }
    }
}

/// POST /logout
async fn logout(State(state): State<AppState>, session: SessionHandle) -> Json<MessageResponse> {
    state.auth.logout(&session).await;

    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}
