//! Mini Cache - workload driver
//!
//! Runs a configurable mixed get/set/renew/evict workload against the typed
//! cache and logs engine statistics while it runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::config::{BackendKind, CodecKind};
use mini_cache::{spawn_stats_reporter, Backend, Cache, Codec, Config, MemoryBackend};

/// Value type written by the workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sample {
    id: u64,
    name: String,
    tags: Vec<String>,
    score: f64,
}

/// Outcome counters shared by all workers.
#[derive(Debug, Default)]
struct Tally {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

/// Main entry point for the workload driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the configured backend
/// 4. Start the stats reporter (memory backend only)
/// 5. Run workers until RUN_SECS elapses or SIGINT/SIGTERM arrives
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache workload");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, codec={:?}, workers={}, keyspace={}, ttl={}s, run={}s",
        config.backend,
        config.codec,
        config.workers,
        config.keyspace,
        config.default_ttl,
        config.run_secs
    );

    let (backend, memory) = build_backend(&config).await?;
    let reporter = memory
        .as_ref()
        .map(|memory| spawn_stats_reporter(Arc::clone(memory), config.stats_interval));

    let tally = match config.codec {
        CodecKind::Json => run_workload(Cache::json(backend), &config).await,
        CodecKind::Bincode => run_workload(Cache::bincode(backend), &config).await,
    }?;

    if let Some(reporter) = reporter {
        reporter.abort();
    }

    info!(
        hits = tally.hits.load(Ordering::Relaxed),
        misses = tally.misses.load(Ordering::Relaxed),
        writes = tally.writes.load(Ordering::Relaxed),
        errors = tally.errors.load(Ordering::Relaxed),
        "Workload finished"
    );
    if let Some(memory) = memory {
        let stats = memory.stats().await;
        info!(
            "Final engine stats: entries={}, expirations={}, hit_rate={:.3}",
            stats.total_entries,
            stats.expirations,
            stats.hit_rate()
        );
    }

    Ok(())
}

async fn build_backend(
    config: &Config,
) -> anyhow::Result<(Arc<dyn Backend>, Option<Arc<MemoryBackend>>)> {
    match config.backend {
        BackendKind::Memory => {
            let memory = Arc::new(MemoryBackend::from_config(config));
            let shared: Arc<dyn Backend> = memory.clone();
            info!("Memory backend initialized");
            Ok((shared, Some(memory)))
        }
        BackendKind::Redis => connect_redis(config).await.map(|backend| (backend, None)),
    }
}

#[cfg(feature = "redis-backend")]
async fn connect_redis(config: &Config) -> anyhow::Result<Arc<dyn Backend>> {
    let backend = mini_cache::RedisBackend::from_config(config)
        .await
        .with_context(|| format!("connecting to {}", config.redis_url))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "redis-backend"))]
async fn connect_redis(_config: &Config) -> anyhow::Result<Arc<dyn Backend>> {
    anyhow::bail!("built without redis support; rebuild with --features redis-backend")
}

/// Spawns the workers and waits for the run to end.
async fn run_workload<C>(cache: Cache<C>, config: &Config) -> anyhow::Result<Arc<Tally>>
where
    C: Codec<Sample> + 'static,
{
    let cache = Arc::new(cache);
    let tally = Arc::new(Tally::default());
    let (stop_tx, stop_rx) = watch::channel(false);
    let keyspace = config.keyspace.max(1) as u64;
    let ttl = config.ttl();

    let mut workers = JoinSet::new();
    for worker in 0..config.workers.max(1) as u64 {
        workers.spawn(worker_loop(
            worker,
            Arc::clone(&cache),
            Arc::clone(&tally),
            stop_rx.clone(),
            keyspace,
            ttl,
        ));
    }
    info!("{} workers started", config.workers.max(1));

    wait_for_stop(config.run_secs).await;
    stop_tx.send(true).context("workers stopped before shutdown")?;

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "worker task failed");
        }
    }

    Ok(tally)
}

async fn worker_loop<C>(
    worker: u64,
    cache: Arc<Cache<C>>,
    tally: Arc<Tally>,
    stop: watch::Receiver<bool>,
    keyspace: u64,
    ttl: Duration,
) where
    C: Codec<Sample> + 'static,
{
    let mut n: u64 = 0;
    while !*stop.borrow() {
        n = n.wrapping_add(1);
        let slot = n.wrapping_mul(7919).wrapping_add(worker) % keyspace;
        let key = format!("sample:{slot}");

        let result = match n % 10 {
            0..=5 => cache.fetch::<Sample>(&key, ttl).await.map(|_| ()),
            6 | 7 => {
                let sample = Sample {
                    id: slot,
                    name: format!("worker-{worker}"),
                    tags: vec!["bench".to_string(), format!("n{}", n % 100)],
                    score: n as f64 / 3.0,
                };
                cache.set(&key, &sample, ttl).await.map(|_| {
                    tally.writes.fetch_add(1, Ordering::Relaxed);
                })
            }
            8 => cache.renew(&key, ttl).await,
            _ => cache.evict(&key).await,
        };

        match result {
            Ok(()) if n % 10 <= 5 => {
                tally.hits.fetch_add(1, Ordering::Relaxed);
            }
            Ok(()) => {}
            Err(err) if err.is_miss() => {
                tally.misses.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                tally.errors.fetch_add(1, Ordering::Relaxed);
                warn!(worker, key = %key, error = %err, "cache operation failed");
            }
        }

        tokio::task::yield_now().await;
    }
}

/// Waits for the configured run time, Ctrl+C or SIGTERM, whichever comes first.
async fn wait_for_stop(run_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        if run_secs == 0 {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_secs(run_secs)).await;
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping workers...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping workers...");
        }
        _ = deadline => {
            info!("Run time elapsed, stopping workers...");
        }
    }
}
