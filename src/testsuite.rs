//! Shared Contract Tests
//!
//! Assertions every [`Backend`] and every typed [`Cache`] over it must pass.
//! Each implementation's test module runs these against its own instance.
//! Keys are prefixed so runs against a shared server do not collide.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::backend::Backend;
use crate::cache::Cache;
use crate::codec::Codec;
use crate::error::CacheError;

const LONG_TTL: Duration = Duration::from_secs(60);
const SHORT_TTL: Duration = Duration::from_millis(100);
const PAST_SHORT_TTL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Data {
    pub name: String,
    pub phone: String,
    pub siblings: i32,
    pub spouse: bool,
    pub money: f64,
}

pub(crate) fn sample() -> Data {
    Data {
        name: "Grace".to_string(),
        phone: "+1-555-0100".to_string(),
        siblings: 3,
        spouse: true,
        money: 1234.5,
    }
}

pub(crate) fn sentinel() -> Data {
    Data {
        name: "sentinel".to_string(),
        phone: String::new(),
        siblings: -1,
        spouse: false,
        money: 0.0,
    }
}

fn assert_miss(result: Result<(), CacheError>, what: &str) {
    match result {
        Err(CacheError::Miss) => {}
        other => panic!("{what}: expected a miss, got {other:?}"),
    }
}

// == Backend Contract ==
/// Byte-level contract: set/get/overwrite, miss semantics, renew, delete and
/// expiry.
pub(crate) async fn backend_contract(backend: &dyn Backend, prefix: &str) {
    let key = format!("{prefix}:bytes");
    let missing = format!("{prefix}:missing");

    // Set then get
    backend.set(&key, b"value1", LONG_TTL).await.unwrap();
    let mut out = Vec::new();
    backend.get(&key, &mut out, LONG_TTL).await.unwrap();
    assert_eq!(out, b"value1");

    // Overwrite
    backend.set(&key, b"value2", LONG_TTL).await.unwrap();
    out.clear();
    backend.get(&key, &mut out, LONG_TTL).await.unwrap();
    assert_eq!(out, b"value2");

    // Miss leaves the sink untouched
    let mut untouched = b"sentinel".to_vec();
    assert_miss(backend.get(&missing, &mut untouched, LONG_TTL).await, "get missing");
    assert_eq!(untouched, b"sentinel");

    // Renew
    backend.renew(&key, LONG_TTL).await.unwrap();
    assert_miss(backend.renew(&missing, LONG_TTL).await, "renew missing");

    // Delete
    backend.delete(&key).await.unwrap();
    assert_miss(backend.delete(&key).await, "delete twice");
    assert_miss(backend.delete(&missing).await, "delete missing");
    assert_miss(backend.get(&key, &mut untouched, LONG_TTL).await, "get deleted");
    assert_eq!(untouched, b"sentinel");

    // Expiry
    backend.set(&key, b"short", SHORT_TTL).await.unwrap();
    sleep(PAST_SHORT_TTL).await;
    assert_miss(backend.get(&key, &mut untouched, LONG_TTL).await, "get expired");
    assert_miss(backend.renew(&key, LONG_TTL).await, "renew expired");
    assert_miss(backend.delete(&key).await, "delete expired");
    assert_eq!(untouched, b"sentinel");
}

// == Typed Cache Contract ==
/// Typed contract over `backend` with the given codec.
pub(crate) async fn cache_contract<C>(backend: Arc<dyn Backend>, codec: C, prefix: &str)
where
    C: Codec<Data>,
{
    let cache = Cache::new(backend, codec);
    let key = format!("{prefix}:typed");
    let missing = format!("{prefix}:typed-missing");

    // Round trip
    cache.set(&key, &sample(), LONG_TTL).await.unwrap();
    let mut out = sentinel();
    cache.get(&key, &mut out, LONG_TTL).await.unwrap();
    assert_eq!(out, sample());

    // Overwrite
    let updated = Data {
        siblings: 4,
        ..sample()
    };
    cache.set(&key, &updated, LONG_TTL).await.unwrap();
    let back: Data = cache.fetch(&key, LONG_TTL).await.unwrap();
    assert_eq!(back, updated);

    // Miss leaves the output untouched
    let mut out = sentinel();
    assert_miss(cache.get(&missing, &mut out, LONG_TTL).await, "typed get missing");
    assert_eq!(out, sentinel());

    // Renew and evict
    cache.renew(&key, LONG_TTL).await.unwrap();
    assert_miss(cache.renew(&missing, LONG_TTL).await, "typed renew missing");
    cache.evict(&key).await.unwrap();
    assert_miss(cache.evict(&key).await, "typed evict twice");

    // Expiry
    cache.set(&key, &sample(), SHORT_TTL).await.unwrap();
    sleep(PAST_SHORT_TTL).await;
    assert_miss(cache.get(&key, &mut out, LONG_TTL).await, "typed get expired");
    assert_eq!(out, sentinel());
}
