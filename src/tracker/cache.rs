//! Expiring page cache stage.
//!
//! Looks the URL up under its cache key; a non-empty value is a hit and is
//! returned without touching the inner source. On a miss the inner source
//! is called and its result written back with SETEX, so expiry is left
//! entirely to the store.
//!
//! Misses for the same URL are serialised through a per-URL async lock and
//! the store is re-read once the lock is held. Concurrent callers missing
//! together therefore cause one inner call, not one each. Different URLs
//! never wait on each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, TrackError};
use crate::fetch::PageSource;
use crate::store::KvStore;

use super::keys::KeyScheme;

/// Hit/miss counters since the cache was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0 when nothing was looked up).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Caches the inner source's pages in the store for `ttl_secs`.
pub struct ExpiringCache {
    inner: Arc<dyn PageSource>,
    store: Arc<dyn KvStore>,
    keys: KeyScheme,
    ttl_secs: u64,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExpiringCache {
    pub fn new(
        inner: Arc<dyn PageSource>,
        store: Arc<dyn KvStore>,
        keys: KeyScheme,
        ttl_secs: u64,
    ) -> Self {
        Self {
            inner,
            store,
            keys,
            ttl_secs,
            in_flight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Cached page for `cache_key`, if a non-empty one is stored.
    async fn lookup(&self, cache_key: &str) -> Result<Option<String>> {
        match self.store.get(cache_key).await? {
            Some(bytes) if !bytes.is_empty() => String::from_utf8(bytes).map(Some).map_err(|e| {
                TrackError::Decode(format!("Cached page '{}' is not UTF-8: {}", cache_key, e))
            }),
            _ => Ok(None),
        }
    }

    async fn fill(&self, url: &str, cache_key: &str) -> Result<String> {
        // Declared before `lock` so it drops after it, including when this
        // future is cancelled mid-wait.
        let _cleanup = InFlightCleanup {
            in_flight: &self.in_flight,
            cache_key,
        };
        let lock = self
            .in_flight
            .entry(cache_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;
        // Another caller may have filled the entry while we waited.
        match self.lookup(cache_key).await? {
            Some(page) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(url, "Cache hit after wait");
                Ok(page)
            }
            None => self.miss(url, cache_key).await,
        }
    }

    async fn miss(&self, url: &str, cache_key: &str) -> Result<String> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(url, ttl_secs = self.ttl_secs, "Cache miss");
        let page = self.inner.get_page(url).await?;
        self.store
            .set_ex(cache_key, self.ttl_secs, page.as_bytes())
            .await?;
        Ok(page)
    }
}

/// Removes a URL's in-flight lock once no caller holds it.
struct InFlightCleanup<'a> {
    in_flight: &'a DashMap<String, Arc<Mutex<()>>>,
    cache_key: &'a str,
}

impl Drop for InFlightCleanup<'_> {
    fn drop(&mut self) {
        self.in_flight
            .remove_if(self.cache_key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[async_trait]
impl PageSource for ExpiringCache {
    async fn get_page(&self, url: &str) -> Result<String> {
        let cache_key = self.keys.cache_key(url);
        if let Some(page) = self.lookup(&cache_key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(url, "Cache hit");
            return Ok(page);
        }
        self.fill(url, &cache_key).await
    }
}
