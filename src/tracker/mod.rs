//! Expiring web cache and per-URL access tracker.
//!
//! The pipeline is composed explicitly:
//!
//! ```text
//! PageTracker::get_page ─▶ ExpiringCache ─(miss)─▶ CallCounter ─▶ source
//! ```
//!
//! The counter sits inside the cache, so a URL's count only moves when the
//! cache misses: it counts network fetches, not lookups.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagetrack::config::Config;
//! use pagetrack::fetch::HttpFetcher;
//! use pagetrack::store::MemoryStore;
//! use pagetrack::tracker::PageTracker;
//!
//! # async fn run() -> pagetrack::error::Result<()> {
//! let config = Config::default();
//! let tracker = PageTracker::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(HttpFetcher::new(&config.http)?),
//!     &config.cache,
//! );
//! let html = tracker.get_page("http://example.com").await?;
//! assert_eq!(tracker.access_count("http://example.com").await?, 1);
//! # let _ = html;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod counter;
pub mod keys;

use std::sync::Arc;

use crate::config::CacheSettings;
use crate::error::{Result, TrackError};
use crate::fetch::PageSource;
use crate::store::KvStore;

pub use cache::{CacheStats, ExpiringCache};
pub use counter::CallCounter;
pub use keys::KeyScheme;

/// Composition root: owns the cache → counter → source pipeline and reads
/// back counters.
pub struct PageTracker {
    pipeline: ExpiringCache,
    store: Arc<dyn KvStore>,
    keys: KeyScheme,
}

impl PageTracker {
    pub fn new(
        store: Arc<dyn KvStore>,
        source: Arc<dyn PageSource>,
        settings: &CacheSettings,
    ) -> Self {
        let keys = KeyScheme::from_settings(settings);
        let counted = CallCounter::new(source, store.clone(), keys.clone());
        let pipeline = ExpiringCache::new(
            Arc::new(counted),
            store.clone(),
            keys.clone(),
            settings.ttl_secs,
        );
        Self {
            pipeline,
            store,
            keys,
        }
    }

    /// Page text for `url`, from the cache when fresh.
    pub async fn get_page(&self, url: &str) -> Result<String> {
        self.pipeline.get_page(url).await
    }

    /// Number of times `url` was fetched from its source. A URL never
    /// fetched reads as 0.
    pub async fn access_count(&self, url: &str) -> Result<u64> {
        let key = self.keys.count_key(url);
        let Some(bytes) = self.store.get(&key).await? else {
            return Ok(0);
        };
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                TrackError::Decode(format!(
                    "Counter '{}' holds a non-integer value: {}",
                    key,
                    String::from_utf8_lossy(&bytes)
                ))
            })
    }

    pub fn stats(&self) -> CacheStats {
        self.pipeline.stats()
    }

    pub fn keys(&self) -> &KeyScheme {
        &self.keys
    }
}

#[async_trait::async_trait]
impl PageSource for PageTracker {
    async fn get_page(&self, url: &str) -> Result<String> {
        self.pipeline.get_page(url).await
    }
}
