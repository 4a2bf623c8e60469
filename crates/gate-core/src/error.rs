//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid secret")]
    InvalidSecret,

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] gate_proxy::ProxyError),

    #[error("Upstream returned no image URL")]
    MissingImage,

    #[error("Store error: {0}")]
    Store(#[from] gate_store::StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] gate_auth::AuthError),
}
