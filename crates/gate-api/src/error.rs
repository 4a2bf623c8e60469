//! API error types
//!
//! Every failure reaching a handler boundary is mapped to a status code and
//! a minimal `{"error": ...}` body. Internal details are logged only.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use gate_auth::AuthError;
use gate_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid secret")]
    InvalidSecret,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Session persistence error: {0}")]
    SessionPersistence(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Unauthorized | AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::Unauthorized
            }
            AuthError::SessionPersistence(msg) => ApiError::SessionPersistence(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            CoreError::InvalidSecret => ApiError::InvalidSecret,
            CoreError::Upstream(e) => ApiError::Upstream(e.to_string()),
            CoreError::MissingImage => ApiError::Upstream("no image URL in response".to_string()),
            CoreError::Auth(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "Authentication required".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            ApiError::InvalidSecret => (StatusCode::UNAUTHORIZED, "Invalid secret".to_string()),
            ApiError::Upstream(detail) => {
                warn!("Upstream failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch response from upstream provider".to_string(),
                )
            }
            ApiError::SessionPersistence(detail) => {
                error!("Session persistence failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save session".to_string(),
                )
            }
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_proxy::ProxyError;

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::InvalidCredentials
        ));
        assert!(matches!(
            ApiError::from(AuthError::Unauthorized),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(AuthError::SessionPersistence("x".into())),
            ApiError::SessionPersistence(_)
        ));
    }

    #[test]
    fn test_upstream_error_hides_details() {
        let err = ApiError::from(CoreError::Upstream(ProxyError::UpstreamError {
            status: 401,
            message: "Incorrect API key provided: sk-abc".to_string(),
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::FORBIDDEN),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ApiError::InvalidSecret, StatusCode::UNAUTHORIZED),
            (
                ApiError::RateLimited {
                    retry_after_secs: 5,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
