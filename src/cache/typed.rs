//! Typed Cache Module
//!
//! Composes a byte [`Backend`] with a [`Codec`]: values are encoded into a
//! pooled buffer on the way in and decoded into the caller's output on the
//! way out. Renew and evict go straight to the backend.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::backend::Backend;
use crate::cache::BufferPool;
use crate::codec::{BincodeCodec, Codec, JsonCodec, ProtobufCodec};
use crate::error::{CacheError, Result};

// == Cache ==
/// Typed front-end over a shared backend.
///
/// The cache owns neither the backend's lifecycle nor any stored data; it
/// only delegates. Errors from either layer are returned unchanged.
pub struct Cache<C> {
    backend: Arc<dyn Backend>,
    codec: C,
    buffers: BufferPool,
}

impl<C> Cache<C> {
    // == Constructor ==
    pub fn new(backend: Arc<dyn Backend>, codec: C) -> Self {
        Self::with_pool(backend, codec, BufferPool::new())
    }

    pub fn with_pool(backend: Arc<dyn Backend>, codec: C, buffers: BufferPool) -> Self {
        Self {
            backend,
            codec,
            buffers,
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    // == Get ==
    /// Reads `key` into `out` and restarts its TTL.
    ///
    /// `out` is written only after both the backend read and the decode
    /// succeeded; on a miss or any error it keeps its previous value.
    pub async fn get<T>(&self, key: &str, out: &mut T, ttl: Duration) -> Result<()>
    where
        C: Codec<T>,
    {
        *out = self.fetch(key, ttl).await?;
        Ok(())
    }

    // == Fetch ==
    /// Reads and decodes `key`, restarting its TTL.
    pub async fn fetch<T>(&self, key: &str, ttl: Duration) -> Result<T>
    where
        C: Codec<T>,
    {
        let mut buf = self.buffers.acquire();
        self.backend
            .get(key, &mut buf, ttl)
            .await
            .map_err(|err| backend_failure("get", key, err))?;

        let value = self.codec.decode(&buf).map_err(|err| {
            warn!(key, codec = self.codec.name(), error = %err, "failed to decode cached value");
            err
        })?;
        Ok(value)
    }

    // == Set ==
    /// Encodes `value` and stores it under `key` for `ttl`.
    ///
    /// An encode failure is returned without calling the backend.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>
    where
        C: Codec<T>,
    {
        let mut buf = self.buffers.acquire();
        self.codec.encode(value, &mut buf).map_err(|err| {
            warn!(key, codec = self.codec.name(), error = %err, "failed to encode value");
            err
        })?;

        self.backend
            .set(key, &buf, ttl)
            .await
            .map_err(|err| backend_failure("set", key, err))
    }

    // == Renew ==
    /// Restarts the TTL of `key` without decoding it.
    pub async fn renew(&self, key: &str, ttl: Duration) -> Result<()> {
        self.backend
            .renew(key, ttl)
            .await
            .map_err(|err| backend_failure("renew", key, err))
    }

    // == Evict ==
    /// Removes `key`. Returns a miss if it was already absent.
    pub async fn evict(&self, key: &str) -> Result<()> {
        self.backend
            .delete(key)
            .await
            .map_err(|err| backend_failure("evict", key, err))
    }
}

/// Logs store failures and hands the error back unchanged. Misses and
/// rejected arguments are not failures of the store.
fn backend_failure(op: &'static str, key: &str, err: CacheError) -> CacheError {
    if let CacheError::Backend(source) = &err {
        warn!(op, key, error = %source, "backend operation failed");
    }
    err
}

impl Cache<JsonCodec> {
    pub fn json(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend, JsonCodec)
    }
}

impl Cache<BincodeCodec> {
    pub fn bincode(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend, BincodeCodec)
    }
}

impl Cache<ProtobufCodec> {
    pub fn protobuf(backend: Arc<dyn Backend>) -> Self {
        Self::new(backend, ProtobufCodec)
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Cache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &"<dyn Backend>")
            .field("codec", &self.codec)
            .field("buffers", &self.buffers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::time::sleep;
    use tokio_test::assert_ok;

    use crate::backend::MemoryBackend;
    use crate::testsuite::{cache_contract, sample, sentinel, Data};

    const SECOND: Duration = Duration::from_secs(1);

    #[derive(Clone, PartialEq, prost::Message)]
    struct Span {
        #[prost(int64, tag = "1")]
        seconds: i64,
        #[prost(int32, tag = "2")]
        nanos: i32,
    }

    /// Backend that counts calls and fails every operation.
    #[derive(Default)]
    struct FailingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Backend for FailingBackend {
        async fn get(&self, _key: &str, out: &mut Vec<u8>, _ttl: Duration) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            out.extend_from_slice(b"{\"partial\"");
            Err(CacheError::backend("connection reset"))
        }

        async fn set(&self, _key: &str, _data: &[u8], _ttl: Duration) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::backend("connection reset"))
        }

        async fn renew(&self, _key: &str, _ttl: Duration) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::backend("connection reset"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::backend("connection reset"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_satisfies_cache_contract() {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
        cache_contract(backend.clone(), JsonCodec, "json").await;
        cache_contract(backend, BincodeCodec, "bincode").await;
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let cache = Cache::json(Arc::new(MemoryBackend::new()));

        assert_ok!(cache.set("key", &sample(), SECOND).await);

        let mut out = sentinel();
        assert_ok!(cache.get("key", &mut out, SECOND).await);
        assert_eq!(out, sample());
    }

    #[tokio::test]
    async fn test_bincode_roundtrip() {
        let cache = Cache::bincode(Arc::new(MemoryBackend::new()));

        cache.set("key", &sample(), SECOND).await.unwrap();
        let out: Data = cache.fetch("key", SECOND).await.unwrap();
        assert_eq!(out, sample());
    }

    #[tokio::test]
    async fn test_protobuf_roundtrip() {
        let cache = Cache::protobuf(Arc::new(MemoryBackend::new()));
        let value = Span {
            seconds: 20,
            nanos: 20,
        };

        cache.set("key", &value, SECOND).await.unwrap();

        let mut out = Span::default();
        cache.get("key", &mut out, SECOND).await.unwrap();
        assert_eq!(out, value);
    }

    #[tokio::test]
    async fn test_miss_leaves_output_untouched() {
        let cache = Cache::json(Arc::new(MemoryBackend::new()));

        let mut out = sentinel();
        let err = cache.get("missing", &mut out, SECOND).await.unwrap_err();
        assert!(err.is_miss());
        assert_eq!(out, sentinel());
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_output_untouched() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set("key", b"not json", SECOND).await.unwrap();
        let cache = Cache::json(backend);

        let mut out = sentinel();
        let err = cache.get("key", &mut out, SECOND).await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
        assert_eq!(out, sentinel());
    }

    #[tokio::test]
    async fn test_backend_error_propagates_unchanged() {
        let backend = Arc::new(FailingBackend::default());
        let cache = Cache::json(backend.clone());

        let mut out = sentinel();
        let err = cache.get("key", &mut out, SECOND).await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert_eq!(out, sentinel());

        assert!(matches!(
            cache.set("key", &sample(), SECOND).await,
            Err(CacheError::Backend(_))
        ));
        assert!(matches!(
            cache.renew("key", SECOND).await,
            Err(CacheError::Backend(_))
        ));
        assert!(matches!(
            cache.evict("key").await,
            Err(CacheError::Backend(_))
        ));
        // No retries: exactly one backend call per operation.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_backend_failure_returns_error_unchanged() {
        assert!(backend_failure("get", "k", CacheError::Miss).is_miss());
        assert!(matches!(
            backend_failure("set", "k", CacheError::InvalidArgument("empty".into())),
            CacheError::InvalidArgument(msg) if msg == "empty"
        ));

        let err = backend_failure("renew", "k", CacheError::backend("connection reset"));
        assert_eq!(err.to_string(), "Backend error: connection reset");
    }

    #[tokio::test]
    async fn test_encode_failure_skips_backend() {
        let backend = Arc::new(FailingBackend::default());
        let cache = Cache::json(backend.clone());

        let mut value = std::collections::HashMap::new();
        value.insert((1u8, 2u8), 3u8);

        let err = cache.set("key", &value, SECOND).await.unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renew_and_evict_pass_through() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = Cache::json(backend.clone());

        cache.set("key", &sample(), Duration::from_millis(100)).await.unwrap();
        sleep(Duration::from_millis(80)).await;
        assert_ok!(cache.renew("key", SECOND).await);

        sleep(Duration::from_millis(500)).await;
        let out: Data = cache.fetch("key", SECOND).await.unwrap();
        assert_eq!(out, sample());

        assert_ok!(cache.evict("key").await);
        assert!(cache.evict("key").await.unwrap_err().is_miss());
        assert!(cache.renew("key", SECOND).await.unwrap_err().is_miss());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_buffers_are_reused() {
        let cache = Cache::json(Arc::new(MemoryBackend::new()));

        cache.set("key", &sample(), SECOND).await.unwrap();
        let _: Data = cache.fetch("key", SECOND).await.unwrap();
        let _ = cache.fetch::<Data>("missing", SECOND).await;

        assert_eq!(cache.buffers.idle(), 1);
    }
}
