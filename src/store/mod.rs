//! Key-value store abstraction.
//!
//! `KvStore` is the narrow slice of Redis commands the pipeline and the
//! value store need. [`RedisStore`] talks to a real server; [`MemoryStore`]
//! keeps everything in-process with the same TTL and type semantics.
//! Use [`create_store`] to build the backend named in the config.

pub mod factory;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use crate::error::Result;

pub use factory::create_store;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Commands consumed from the external key-value store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// GET: the value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// SET without expiry. Clears any TTL previously on the key.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// SETEX: set `value` and expire it after `ttl_secs` seconds.
    async fn set_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<()>;

    /// INCR: add one to the integer under `key` (absent counts as 0) and
    /// return the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// RPUSH: append to the list under `key`, returning the new length.
    async fn rpush(&self, key: &str, value: &[u8]) -> Result<u64>;

    /// LRANGE with Redis index rules (inclusive, negatives count from the end).
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;

    /// FLUSHDB: drop every key in the selected database.
    async fn flush_db(&self) -> Result<()>;
}
