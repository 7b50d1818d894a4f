//! Memory Backend Module
//!
//! Provides the in-process eviction engine with sliding TTL expiration.

mod entry;
mod expiry;
mod stats;
mod store;

// Re-export public types
pub(crate) use entry::{deadline_after, CacheEntry};
pub use stats::CacheStats;
pub use store::{MemoryBackend, MemoryLimits};
