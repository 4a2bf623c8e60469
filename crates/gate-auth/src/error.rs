//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session middleware not installed")]
    MissingSession,

    #[error("Failed to persist session: {0}")]
    SessionPersistence(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Credential store error: {0}")]
    Store(#[from] gate_store::StoreError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::Jwt(_) => {
                StatusCode::FORBIDDEN
            }
            AuthError::MissingSession
            | AuthError::SessionPersistence(_)
            | AuthError::PasswordHash(_)
            | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to clients
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid username or password",
            AuthError::Unauthorized
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::Jwt(_) => "Authentication required",
            AuthError::SessionPersistence(_) => "Failed to save session",
            AuthError::MissingSession | AuthError::PasswordHash(_) | AuthError::Store(_) => {
                "Internal error"
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "error": self.public_message()
        }));

        (self.status_code(), body).into_response()
    }
}
