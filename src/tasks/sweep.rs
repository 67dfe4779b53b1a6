//! Expired-entry sweep
//!
//! Reads already drop expired entries; the sweep bounds memory held by keys
//! that are written and never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheSet;

/// Spawns a task that removes expired entries from every cache each `interval`.
///
/// The returned handle is aborted on shutdown. A zero interval disables the
/// sweep and the task exits immediately.
pub fn spawn_sweep_task(caches: CacheSet, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval.is_zero() {
            warn!("cache sweep interval is zero; sweep disabled");
            return;
        }
        info!(interval_secs = interval.as_secs(), "starting cache sweep task");

        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = caches.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "cache sweep removed expired entries");
            } else {
                debug!("cache sweep found no expired entries");
            }
        }
    })
}
