//! Call-counting stage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::fetch::PageSource;
use crate::store::KvStore;

use super::keys::KeyScheme;

/// Increments the URL's access counter, then calls through to `inner`.
///
/// The increment happens before the inner call and is not rolled back if
/// that call fails.
pub struct CallCounter {
    inner: Arc<dyn PageSource>,
    store: Arc<dyn KvStore>,
    keys: KeyScheme,
}

impl CallCounter {
    pub fn new(inner: Arc<dyn PageSource>, store: Arc<dyn KvStore>, keys: KeyScheme) -> Self {
        Self { inner, store, keys }
    }
}

#[async_trait]
impl PageSource for CallCounter {
    async fn get_page(&self, url: &str) -> Result<String> {
        let count = self.store.incr(&self.keys.count_key(url)).await?;
        debug!(url, count, "Access counted");
        self.inner.get_page(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::fetch::MockSource;
    use crate::store::{MemoryStore, MockKvStore};

    #[tokio::test]
    async fn test_counts_every_call() {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(MockSource::new().with_page("http://a.test", "A"));
        let counter = CallCounter::new(source.clone(), store.clone(), KeyScheme::default());

        assert_eq!(counter.get_page("http://a.test").await.unwrap(), "A");
        assert_eq!(counter.get_page("http://a.test").await.unwrap(), "A");

        assert_eq!(source.calls(), 2);
        assert_eq!(
            store.get("count:http://a.test").await.unwrap(),
            Some(b"2".to_vec())
        );
    }

    #[tokio::test]
    async fn test_counts_even_when_inner_fails() {
        let store = Arc::new(MemoryStore::new());
        let counter = CallCounter::new(
            Arc::new(MockSource::failing()),
            store.clone(),
            KeyScheme::default(),
        );
        assert!(counter.get_page("http://down.test").await.is_err());
        assert_eq!(
            store.get("count:http://down.test").await.unwrap(),
            Some(b"1".to_vec())
        );
    }

    #[tokio::test]
    async fn test_store_failure_skips_inner_call() {
        let mut store = MockKvStore::new();
        store
            .expect_incr()
            .times(1)
            .returning(|_| Err(TrackError::Store("connection refused".into())));
        let source = Arc::new(MockSource::new());
        let counter = CallCounter::new(source.clone(), Arc::new(store), KeyScheme::default());

        let err = counter.get_page("http://a.test").await.unwrap_err();
        assert!(matches!(err, TrackError::Store(_)));
        assert_eq!(source.calls(), 0);
    }
}
