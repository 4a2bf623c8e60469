//! Background session maintenance

use gate_store::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Spawn a task that periodically purges expired sessions
pub fn spawn_session_reaper(
    sessions: Arc<dyn SessionStore>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{Duration, interval};

    info!(
        "Starting background session reaper (interval: {} seconds)",
        interval_secs
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match sessions.purge_expired().await {
                Ok(0) => debug!("No expired sessions to purge"),
                Ok(removed) => info!("Purged {} expired sessions", removed),
                Err(e) => warn!("Error purging expired sessions: {}", e),
            }
        }
    })
}
