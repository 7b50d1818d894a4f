//! Expiration Handles
//!
//! One deferred task per live key. A handle owns its task: dropping the handle
//! aborts the task, so replacing or removing a slot always disposes of the
//! previous timer.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

// == Timer Gauge ==
/// Counts expiration tasks that have been spawned but not yet disposed of.
#[derive(Debug, Clone, Default)]
pub struct TimerGauge {
    live: Arc<AtomicUsize>,
}

impl TimerGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task. The count drops when the token is dropped.
    pub fn track(&self) -> TimerToken {
        self.live.fetch_add(1, Ordering::SeqCst);
        TimerToken {
            live: Arc::clone(&self.live),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Moved into the task future; dropped when the task finishes or is aborted.
#[derive(Debug)]
pub struct TimerToken {
    live: Arc<AtomicUsize>,
}

impl Drop for TimerToken {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Expiry Handle ==
/// Scheduled removal of a single key.
#[derive(Debug)]
pub struct ExpiryHandle {
    id: u64,
    task: JoinHandle<()>,
}

impl ExpiryHandle {
    /// Spawns a task that waits until `deadline` and then runs `fire`.
    ///
    /// `deadline` must be the same instant stored on the entry, so the task
    /// never fires while the entry is still readable. `fire` must re-check
    /// `id` under the engine guard before removing anything: an abort cannot
    /// stop a task that already passed its sleep.
    pub fn spawn<F>(runtime: &Handle, id: u64, deadline: Instant, token: TimerToken, fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = runtime.spawn(async move {
            let _token = token;
            tokio::time::sleep_until(deadline).await;
            fire.await;
        });

        Self { id, task }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ExpiryHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
