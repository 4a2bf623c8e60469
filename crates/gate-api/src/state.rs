//! Application state

use gate_auth::AuthService;
use gate_core::CompletionService;
use std::sync::Arc;

use crate::rate_limit::RateLimiter;

/// Prometheus render handle
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub completions: Arc<CompletionService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        completions: Arc<CompletionService>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            auth,
            completions,
            rate_limiter,
        }
    }
}
