//! Global fixed-window request limiter

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::ApiError;

struct Window {
    started: Instant,
    count: u64,
}

/// Fixed-window limiter shared by every route.
///
/// At most `max_requests` requests are admitted per window; the window
/// restarts on the first request after it has elapsed.
pub struct RateLimiter {
    window: Duration,
    max_requests: u64,
    state: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            max_requests,
            state: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Claim a slot in the current window.
    ///
    /// Returns the number of seconds until the window resets when full.
    pub fn try_acquire(&self) -> Result<(), u64> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> Result<(), u64> {
        let mut state = self.state.lock();

        let elapsed = now.saturating_duration_since(state.started);
        if elapsed >= self.window {
            state.started = now;
            state.count = 0;
        }

        if state.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            return Err(remaining.as_secs().max(1));
        }

        state.count += 1;
        Ok(())
    }
}

/// Reject requests once the shared window is exhausted
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(retry_after_secs) = limiter.try_acquire() {
        debug!("Rate limit hit, retry after {}s", retry_after_secs);
        metrics::counter!("llm_gate_rate_limited_total").increment(1);
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    Ok(next.run(request).await)
}
