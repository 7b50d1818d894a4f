//! Cache Module
//!
//! Provides the typed cache that composes a byte backend with a codec, and
//! the buffer pool it uses for scratch space.

mod pool;
mod typed;


// Re-export public types
pub use pool::{BufferPool, PooledBuffer, DEFAULT_MAX_BUFFER_CAPACITY, DEFAULT_MAX_POOLED};
pub use typed::Cache;
