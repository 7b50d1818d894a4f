//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Stats Reporter: Logs memory backend counters at configured intervals

mod reporter;

pub use reporter::spawn_stats_reporter;
