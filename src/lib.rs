//! Mini Cache - A typed cache over pluggable backends and codecs
//!
//! Values are encoded by a [`Codec`] and stored as bytes in a [`Backend`]
//! with sliding TTL expiration. The in-memory backend runs one expiration
//! task per key; a redis backend is available behind the `redis-backend`
//! feature.
//!
//! ```ignore
//! let cache = Cache::json(Arc::new(MemoryBackend::new()));
//! cache.set("user:1", &user, Duration::from_secs(60)).await?;
//! let mut out = User::default();
//! cache.get("user:1", &mut out, Duration::from_secs(60)).await?;
//! ```

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod tasks;

#[cfg(test)]
mod testsuite;

pub use backend::{Backend, MemoryBackend, MemoryLimits};
#[cfg(feature = "redis-backend")]
pub use backend::RedisBackend;
pub use cache::{BufferPool, Cache};
pub use codec::{BincodeCodec, Codec, JsonCodec, ProtobufCodec};
pub use config::Config;
pub use error::{CacheError, CodecError, Result};
pub use tasks::spawn_stats_reporter;
