//! Configuration Module
//!
//! Handles loading cache and workload settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which byte store backs the typed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Redis,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

/// Wire format used by the workload driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Json,
    Bincode,
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(CodecKind::Json),
            "bincode" | "binary" => Ok(CodecKind::Bincode),
            other => Err(format!("unknown codec '{other}'")),
        }
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte store backing the cache
    pub backend: BackendKind,
    /// Codec used by the workload driver
    pub codec: CodecKind,
    /// Connection URL for the redis backend
    pub redis_url: String,
    /// Default TTL in seconds
    pub default_ttl: u64,
    /// Maximum key length in bytes for the memory backend
    pub max_key_length: usize,
    /// Maximum payload size in bytes for the memory backend
    pub max_value_size: usize,
    /// Per-operation timeout in milliseconds for remote backends
    pub op_timeout_ms: u64,
    /// Stats reporting interval in seconds
    pub stats_interval: u64,
    /// Number of concurrent workload tasks
    pub workers: usize,
    /// Number of distinct keys the workload touches
    pub keyspace: usize,
    /// Workload run time in seconds, 0 runs until interrupted
    pub run_secs: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `CACHE_CODEC` - `json` or `bincode` (default: json)
    /// - `REDIS_URL` - Redis connection URL (default: redis://127.0.0.1:6379)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `MAX_KEY_LENGTH` - Maximum key length (default: 256)
    /// - `MAX_VALUE_SIZE` - Maximum payload size (default: 1 MiB)
    /// - `OP_TIMEOUT_MS` - Remote operation timeout (default: 2000)
    /// - `STATS_INTERVAL` - Stats logging frequency in seconds (default: 5)
    /// - `WORKERS` - Concurrent workload tasks (default: 8)
    /// - `KEYSPACE` - Distinct workload keys (default: 1000)
    /// - `RUN_SECS` - Workload duration, 0 = until Ctrl+C (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env_or("CACHE_BACKEND", defaults.backend),
            codec: env_or("CACHE_CODEC", defaults.codec),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            max_key_length: env_or("MAX_KEY_LENGTH", defaults.max_key_length),
            max_value_size: env_or("MAX_VALUE_SIZE", defaults.max_value_size),
            op_timeout_ms: env_or("OP_TIMEOUT_MS", defaults.op_timeout_ms),
            stats_interval: env_or("STATS_INTERVAL", defaults.stats_interval),
            workers: env_or("WORKERS", defaults.workers),
            keyspace: env_or("KEYSPACE", defaults.keyspace),
            run_secs: env_or("RUN_SECS", defaults.run_secs),
        }
    }

    /// Default TTL as a Duration, never zero.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl.max(1))
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            codec: CodecKind::Json,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            default_ttl: 300,
            max_key_length: 256,
            max_value_size: 1024 * 1024,
            op_timeout_ms: 2000,
            stats_interval: 5,
            workers: 8,
            keyspace: 1000,
            run_secs: 30,
        }
    }
}
