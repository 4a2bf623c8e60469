//! LLM Gate REST API
//!
//! This crate provides the Axum-based HTTP API for LLM Gate: login and
//! logout, the chat-completion and image-generation proxy routes, and
//! health and metrics endpoints.

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
