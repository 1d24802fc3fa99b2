use std::time::Duration;

use agora_core::SessionStore;
use tracing::{debug, warn};

/// Background task that deletes sessions past their expiry.
///
/// Resolution already treats expired sessions as absent; this only keeps
/// the table from growing without bound.
pub async fn run_session_sweep(sessions: SessionStore, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let store = sessions.clone();
        match tokio::task::spawn_blocking(move || store.purge_expired()).await {
            Ok(Ok(removed)) => debug!("Session sweep removed {}", removed),
            Ok(Err(e)) => warn!("Session sweep error: {}", e),
            Err(e) => warn!("Session sweep task failed: {}", e),
        }
    }
}
