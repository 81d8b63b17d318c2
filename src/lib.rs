//! pagetrack: an expiring web page cache with per-URL access counters.
//!
//! Pages are fetched over HTTP, cached in a key-value store (Redis or
//! in-memory) for a fixed TTL, and every network fetch bumps a per-URL
//! counter. See [`tracker`] for how the stages are composed.

pub mod config;
pub mod error;
pub mod fetch;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod values;

pub use config::Config;
pub use error::{Result, TrackError};
pub use fetch::{HttpFetcher, PageSource};
pub use store::{create_store, KvStore, MemoryStore, RedisStore};
pub use tracker::{CacheStats, PageTracker};
pub use values::{StoredValue, ValueStore};
