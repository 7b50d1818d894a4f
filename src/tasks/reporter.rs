//! Stats Reporter Task
//!
//! Background task that periodically logs the memory backend's counters.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::MemoryBackend;

/// Spawns a background task that logs backend statistics at a fixed interval.
///
/// The task runs until aborted. Each tick takes a snapshot of the stats and
/// the number of pending expiration tasks.
///
/// # Arguments
/// * `backend` - shared reference to the memory backend
/// * `interval_secs` - Interval in seconds between reports
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let backend = Arc::new(MemoryBackend::new());
/// let reporter = spawn_stats_reporter(backend.clone(), 5);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter(backend: Arc<MemoryBackend>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let stats = backend.stats().await;
            let pending = backend.pending_expirations();

            if stats.hits + stats.misses + stats.sets > 0 {
                info!(
                    hits = stats.hits,
                    misses = stats.misses,
                    sets = stats.sets,
                    deletes = stats.deletes,
                    expirations = stats.expirations,
                    entries = stats.total_entries,
                    pending_timers = pending,
                    hit_rate = stats.hit_rate(),
                    "cache stats"
                );
            } else {
                debug!("cache stats: no activity yet");
            }
        }
    })
}
