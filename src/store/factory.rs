//! Factory for creating the configured key-value store.

use std::sync::Arc;

use tracing::warn;

use crate::config::{Config, StoreBackend};
use crate::error::Result;

use super::{KvStore, MemoryStore, RedisStore};

/// Create the store named by `config.store`.
///
/// Redis connects eagerly so a bad URL or unreachable server fails here
/// rather than on the first page fetch.
pub async fn create_store(config: &Config) -> Result<Arc<dyn KvStore>> {
    match config.store {
        StoreBackend::Redis => Ok(Arc::new(RedisStore::connect(&config.redis_url).await?)),
        StoreBackend::Memory => {
            warn!("Using in-memory store; cache entries and counters are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_store_memory() {
        let mut config = Config::default();
        config.store = StoreBackend::Memory;
        let store = create_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_create_store_redis_bad_url() {
        let mut config = Config::default();
        config.redis_url = "definitely not redis".to_string();
        assert!(create_store(&config).await.is_err());
    }
}
