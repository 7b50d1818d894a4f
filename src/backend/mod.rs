//! Backend Module
//!
//! Byte-oriented key/value stores with TTL semantics. The typed cache sits on
//! top of any [`Backend`]; the in-memory engine lives in [`memory`] and a
//! remote adapter in `redis` (feature `redis-backend`).

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CacheError, Result};

pub use memory::{MemoryBackend, MemoryLimits};
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisBackend;

// == Backend Trait ==
/// Byte-level store with sliding TTL expiration.
///
/// Every implementation must report an absent or expired key as
/// [`CacheError::Miss`] and must leave `out` untouched in that case.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Appends the bytes stored under `key` to `out` and restarts its TTL.
    async fn get(&self, key: &str, out: &mut Vec<u8>, ttl: Duration) -> Result<()>;

    /// Stores `data` under `key`, replacing any previous value and deadline.
    async fn set(&self, key: &str, data: &[u8], ttl: Duration) -> Result<()>;

    /// Restarts the TTL of an existing key without touching its payload.
    async fn renew(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Removes `key` and cancels its expiration.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn get(&self, key: &str, out: &mut Vec<u8>, ttl: Duration) -> Result<()> {
        (**self).get(key, out, ttl).await
    }

    async fn set(&self, key: &str, data: &[u8], ttl: Duration) -> Result<()> {
        (**self).set(key, data, ttl).await
    }

    async fn renew(&self, key: &str, ttl: Duration) -> Result<()> {
        (**self).renew(key, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

// == Argument Validation ==
/// Rejects empty keys.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "Key must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Rejects zero TTLs. A zero duration is never read as "expire now".
pub fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(CacheError::InvalidArgument(
            "TTL must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
