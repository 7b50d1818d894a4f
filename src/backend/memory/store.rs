//! Memory Backend Module
//!
//! In-process eviction engine: a key map guarded by a single mutex, with one
//! expiration task per key and sliding deadlines.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::backend::memory::expiry::{ExpiryHandle, TimerGauge};
use crate::backend::memory::{deadline_after, CacheEntry, CacheStats};
use crate::backend::{validate_key, validate_ttl, Backend};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Limits ==
/// Size limits enforced on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    /// Maximum allowed key length in bytes
    pub max_key_length: usize,
    /// Maximum allowed payload size in bytes
    pub max_value_size: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self {
            max_key_length: 256,
            max_value_size: 1024 * 1024, // 1 MB
        }
    }
}

/// A stored entry together with the timer that will remove it.
#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    expiry: ExpiryHandle,
}

#[derive(Debug, Default)]
struct State {
    slots: HashMap<String, Slot>,
    next_timer_id: u64,
    stats: CacheStats,
}

impl State {
    fn allocate_timer_id(&mut self) -> u64 {
        self.next_timer_id += 1;
        self.next_timer_id
    }

    /// Drops a slot whose deadline passed before its task got the guard.
    fn take_if_expired(&mut self, key: &str) -> bool {
        let expired = self
            .slots
            .get(key)
            .is_some_and(|slot| slot.entry.is_expired());

        if expired {
            self.slots.remove(key);
            self.stats.record_expiration();
            self.stats.set_total_entries(self.slots.len());
            debug!(key, "entry expired on access");
        }
        expired
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    timers: TimerGauge,
    limits: MemoryLimits,
}

impl Inner {
    /// Expiration callback. Removes the slot only if it still carries the
    /// timer that fired; a renewed or replaced slot has a newer id.
    async fn expire(&self, key: &str, timer_id: u64) {
        let mut state = self.state.lock().await;

        let current = state
            .slots
            .get(key)
            .is_some_and(|slot| slot.expiry.id() == timer_id);
        if !current {
            trace!(key, timer_id, "stale expiration ignored");
            return;
        }

        state.slots.remove(key);
        state.stats.record_expiration();
        let total = state.slots.len();
        state.stats.set_total_entries(total);
        debug!(key, "entry expired");
    }
}

// == Memory Backend ==
/// In-memory [`Backend`] with per-key expiration tasks.
///
/// Requires a tokio runtime: expiration tasks are spawned on the runtime of
/// the calling task. Dropping the backend aborts every pending task.
#[derive(Debug)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty backend with default limits.
    pub fn new() -> Self {
        Self::with_limits(MemoryLimits::default())
    }

    /// Creates an empty backend with the given size limits.
    pub fn with_limits(limits: MemoryLimits) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                timers: TimerGauge::new(),
                limits,
            }),
        }
    }

    /// Creates a backend with limits taken from the Config.
    pub fn from_config(config: &Config) -> Self {
        Self::with_limits(MemoryLimits {
            max_key_length: config.max_key_length,
            max_value_size: config.max_value_size,
        })
    }

    pub fn limits(&self) -> MemoryLimits {
        self.inner.limits
    }

    // == Stats ==
    /// Returns a snapshot of the engine counters.
    pub async fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.slots.len());
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, including ones whose deadline
    /// passed but whose task has not run yet.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of expiration tasks spawned and not yet disposed of.
    ///
    /// Aborted tasks are counted until the runtime drops them, which happens
    /// on its next scheduling pass.
    pub fn pending_expirations(&self) -> usize {
        self.inner.timers.live()
    }

    fn check_key(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        if key.len() > self.inner.limits.max_key_length {
            return Err(CacheError::InvalidArgument(format!(
                "Key exceeds maximum length of {} bytes",
                self.inner.limits.max_key_length
            )));
        }
        Ok(())
    }

    /// Spawns the expiration task for `key`, firing at `deadline`. The task
    /// holds only a weak reference so it never keeps a dropped backend alive.
    fn schedule(&self, runtime: &Handle, key: &str, timer_id: u64, deadline: Instant) -> ExpiryHandle {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = key.to_owned();

        ExpiryHandle::spawn(runtime, timer_id, deadline, self.inner.timers.track(), async move {
            if let Some(inner) = inner.upgrade() {
                inner.expire(&key, timer_id).await;
            }
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn current_runtime() -> Result<Handle> {
    Handle::try_current()
        .map_err(|err| CacheError::backend(format!("memory backend needs a tokio runtime: {err}")))
}

#[async_trait]
impl Backend for MemoryBackend {
    // == Get ==
    /// Copies the payload into `out` and restarts the full TTL window.
    async fn get(&self, key: &str, out: &mut Vec<u8>, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;
        let runtime = current_runtime()?;

        let mut state = self.inner.state.lock().await;
        if state.take_if_expired(key) || !state.slots.contains_key(key) {
            state.stats.record_miss();
            trace!(key, "cache miss");
            return Err(CacheError::Miss);
        }

        let deadline = deadline_after(ttl);
        let timer_id = state.allocate_timer_id();
        let expiry = self.schedule(&runtime, key, timer_id, deadline);
        let State { slots, stats, .. } = &mut *state;
        if let Some(slot) = slots.get_mut(key) {
            out.extend_from_slice(&slot.entry.payload);
            slot.entry.touch(deadline);
            // Replacing the handle drops the old one, aborting its task.
            slot.expiry = expiry;
        }
        stats.record_hit();
        trace!(key, ?ttl, "cache hit");
        Ok(())
    }

    // == Set ==
    /// Stores the payload. The replaced slot, if any, is dropped only after
    /// the new one is built, which cancels its timer.
    async fn set(&self, key: &str, data: &[u8], ttl: Duration) -> Result<()> {
        self.check_key(key)?;
        validate_ttl(ttl)?;
        if data.len() > self.inner.limits.max_value_size {
            return Err(CacheError::InvalidArgument(format!(
                "Value exceeds maximum size of {} bytes",
                self.inner.limits.max_value_size
            )));
        }
        let runtime = current_runtime()?;

        let payload = data.to_vec();

        let mut state = self.inner.state.lock().await;
        let deadline = deadline_after(ttl);
        let timer_id = state.allocate_timer_id();
        let slot = Slot {
            entry: CacheEntry::new(payload, deadline),
            expiry: self.schedule(&runtime, key, timer_id, deadline),
        };
        // Dropping the replaced slot aborts its timer.
        drop(state.slots.insert(key.to_owned(), slot));
        state.stats.record_set();
        let total = state.slots.len();
        state.stats.set_total_entries(total);

        trace!(key, size = data.len(), ?ttl, "entry stored");
        Ok(())
    }

    // == Renew ==
    /// Restarts the TTL window without touching the payload.
    async fn renew(&self, key: &str, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;
        let runtime = current_runtime()?;

        let mut state = self.inner.state.lock().await;
        if state.take_if_expired(key) || !state.slots.contains_key(key) {
            state.stats.record_miss();
            return Err(CacheError::Miss);
        }

        let deadline = deadline_after(ttl);
        let timer_id = state.allocate_timer_id();
        let expiry = self.schedule(&runtime, key, timer_id, deadline);
        if let Some(slot) = state.slots.get_mut(key) {
            slot.entry.touch(deadline);
            slot.expiry = expiry;
        }

        trace!(key, ?ttl, "entry renewed");
        Ok(())
    }

    // == Delete ==
    /// Removes the entry and cancels its timer.
    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let mut state = self.inner.state.lock().await;
        if state.take_if_expired(key) {
            state.stats.record_miss();
            return Err(CacheError::Miss);
        }

        match state.slots.remove(key) {
            Some(slot) => {
                drop(slot.expiry);
                state.stats.record_delete();
                let total = state.slots.len();
                state.stats.set_total_entries(total);
                debug!(key, "entry deleted");
                Ok(())
            }
            None => {
                state.stats.record_miss();
                Err(CacheError::Miss)
            }
        }
    }
}
