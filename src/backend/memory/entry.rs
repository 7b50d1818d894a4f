//! Cache Entry Module
//!
//! Defines the structure for individual stored payloads with a sliding deadline.

use std::time::Duration;

use tokio::time::Instant;

/// Longest window honoured by the engine, about 30 years. Larger TTLs are
/// clamped so the deadline never overflows `Instant`.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Returns the instant `ttl` from now, clamped to [`MAX_TTL`].
pub(crate) fn deadline_after(ttl: Duration) -> Instant {
    Instant::now() + ttl.min(MAX_TTL)
}

// == Cache Entry ==
/// Represents a single stored payload with its expiration deadline.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    /// The stored bytes
    pub payload: Vec<u8>,
    /// Instant at which the entry stops being readable
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires at `deadline`.
    pub fn new(payload: Vec<u8>, deadline: Instant) -> Self {
        Self {
            payload,
            expires_at: deadline,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its deadline, even if the expiration task has not run yet.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Touch ==
    /// Replaces the deadline. The previous one is discarded, never extended.
    pub fn touch(&mut self, deadline: Instant) {
        self.expires_at = deadline;
    }
}
