//! Redis Backend Module
//!
//! Remote [`Backend`] over a multiplexed redis connection. Sliding expiration
//! is delegated to the server with `PEXPIRE`; nil replies and zero counts are
//! translated into [`CacheError::Miss`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisResult;
use tracing::{info, warn};

use crate::backend::{validate_key, validate_ttl, Backend};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Default bound on a single round trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

// == Redis Backend ==
/// Byte backend stored in redis.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisBackend {
    /// Connects to `url` and returns a backend with the default timeout.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(CacheError::backend)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(CacheError::backend)?;

        info!(url, "connected to redis");
        Ok(Self::from_connection(conn))
    }

    /// Connects using the URL and timeout from the Config.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::connect(&config.redis_url)
            .await?
            .with_timeout(config.op_timeout()))
    }

    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self {
            conn,
            timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one round trip under the operation timeout.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(|err| {
                warn!(error = %err, "redis command failed");
                CacheError::backend(err)
            }),
            Err(elapsed) => {
                warn!(timeout = ?self.timeout, "redis command timed out");
                Err(CacheError::backend(elapsed))
            }
        }
    }
}

/// TTL in whole milliseconds, rounded up so a key never expires early.
fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_nanos().div_ceil(1_000_000))
        .unwrap_or(u64::MAX)
        .max(1)
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&self, key: &str, out: &mut Vec<u8>, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.cmd("GET")
            .arg(key)
            .cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl));

        let (payload, _renewed): (Option<Vec<u8>>, i64) =
            self.run(pipe.query_async(&mut conn)).await?;

        match payload {
            Some(bytes) => {
                out.extend_from_slice(&bytes);
                Ok(())
            }
            None => Err(CacheError::Miss),
        }
    }

    async fn set(&self, key: &str, data: &[u8], ttl: Duration) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("PSETEX");
        cmd.arg(key).arg(millis(ttl)).arg(data);

        let _: () = self.run(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn renew(&self, key: &str, ttl: Duration) -> Result<()> {
        validate_key(key)?;
        validate_ttl(ttl)?;

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("PEXPIRE");
        cmd.arg(key).arg(millis(ttl));

        let renewed: i64 = self.run(cmd.query_async(&mut conn)).await?;
        if renewed == 0 {
            return Err(CacheError::Miss);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);

        let removed: i64 = self.run(cmd.query_async(&mut conn)).await?;
        if removed < 1 {
            return Err(CacheError::Miss);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
