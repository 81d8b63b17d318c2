//! In-process key-value store with Redis-compatible semantics.
//!
//! Expiry is evaluated lazily on access against `tokio::time::Instant`, so
//! tests running on a paused clock can step past a TTL with
//! `tokio::time::advance`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{Result, TrackError};

use super::KvStore;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Slot {
    Bytes(Vec<u8>),
    List(Vec<Vec<u8>>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Map-backed store. Cheap to construct; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drop `key` if it has expired, then return the live entry, if any.
fn live<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if map.get(key).is_some_and(|entry| entry.is_expired(now)) {
        map.remove(key);
    }
    map.get_mut(key)
}

/// Resolve Redis LRANGE indices against a list of `len` items.
fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut map = self.lock();
        match live(&mut map, key) {
            None => Ok(None),
            Some(Entry {
                slot: Slot::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(TrackError::Store(WRONGTYPE.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.lock().insert(
            key.to_string(),
            Entry {
                slot: Slot::Bytes(value.to_vec()),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> Result<()> {
        if ttl_secs == 0 {
            return Err(TrackError::Store(
                "invalid expire time in 'setex' command".to_string(),
            ));
        }
        self.lock().insert(
            key.to_string(),
            Entry {
                slot: Slot::Bytes(value.to_vec()),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut map = self.lock();
        let current = match live(&mut map, key) {
            None => 0,
            Some(Entry {
                slot: Slot::Bytes(bytes),
                ..
            }) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| {
                    TrackError::Store("value is not an integer or out of range".to_string())
                })?,
            Some(_) => return Err(TrackError::Store(WRONGTYPE.to_string())),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| TrackError::Store("increment or decrement would overflow".to_string()))?;
        // INCR keeps an existing TTL.
        let expires_at = map.get(key).and_then(|entry| entry.expires_at);
        map.insert(
            key.to_string(),
            Entry {
                slot: Slot::Bytes(next.to_string().into_bytes()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn rpush(&self, key: &str, value: &[u8]) -> Result<u64> {
        let mut map = self.lock();
        match live(&mut map, key) {
            None => {
                map.insert(
                    key.to_string(),
                    Entry {
                        slot: Slot::List(vec![value.to_vec()]),
                        expires_at: None,
                    },
                );
                Ok(1)
            }
            Some(Entry {
                slot: Slot::List(items),
                ..
            }) => {
                items.push(value.to_vec());
                Ok(items.len() as u64)
            }
            Some(_) => Err(TrackError::Store(WRONGTYPE.to_string())),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let mut map = self.lock();
        match live(&mut map, key) {
            None => Ok(Vec::new()),
            Some(Entry {
                slot: Slot::List(items),
                ..
            }) => Ok(match range_bounds(items.len(), start, stop) {
                Some((from, to)) => items[from..=to].to_vec(),
                None => Vec::new(),
            }),
            Some(_) => Err(TrackError::Store(WRONGTYPE.to_string())),
        }
    }

    async fn flush_db(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_ex_expires() {
        let store = MemoryStore::new();
        store.set_ex("k", 10, b"v").await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_clears_ttl() {
        let store = MemoryStore::new();
        store.set_ex("k", 1, b"a").await.unwrap();
        store.set("k", b"b").await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get("k").await.unwrap(), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_set_ex_zero_ttl_rejected() {
        let store = MemoryStore::new();
        assert!(store.set_ex("k", 0, b"v").await.is_err());
    }

    #[tokio::test]
    async fn test_incr_creates_and_increments() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("n").await.unwrap(), 1);
        assert_eq!(store.incr("n").await.unwrap(), 2);
        assert_eq!(store.get("n").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_incr_non_integer_fails() {
        let store = MemoryStore::new();
        store.set("n", b"abc").await.unwrap();
        let err = store.incr("n").await.unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[tokio::test]
    async fn test_incr_overflow_fails() {
        let store = MemoryStore::new();
        store.set("n", i64::MAX.to_string().as_bytes()).await.unwrap();
        assert!(store.incr("n").await.is_err());
    }

    #[tokio::test]
    async fn test_list_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.rpush("l", b"a").await.unwrap(), 1);
        assert_eq!(store.rpush("l", b"b").await.unwrap(), 2);
        assert_eq!(store.rpush("l", b"c").await.unwrap(), 3);
        let all = store.lrange("l", 0, -1).await.unwrap();
        assert_eq!(all, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(store.lrange("l", 1, 1).await.unwrap(), vec![b"b".to_vec()]);
        assert_eq!(store.lrange("l", -2, 10).await.unwrap().len(), 2);
        assert!(store.lrange("l", 5, 10).await.unwrap().is_empty());
        assert!(store.lrange("missing", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type_errors() {
        let store = MemoryStore::new();
        store.rpush("l", b"a").await.unwrap();
        store.set("s", b"x").await.unwrap();
        assert!(store.get("l").await.is_err());
        assert!(store.incr("l").await.is_err());
        assert!(store.rpush("s", b"y").await.is_err());
        assert!(store.lrange("s", 0, -1).await.is_err());
    }

    #[tokio::test]
    async fn test_flush_db() {
        let store = MemoryStore::new();
        store.set("a", b"1").await.unwrap();
        store.rpush("b", b"2").await.unwrap();
        store.flush_db().await.unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(range_bounds(3, 0, -1), Some((0, 2)));
        assert_eq!(range_bounds(3, -1, -1), Some((2, 2)));
        assert_eq!(range_bounds(3, -10, 1), Some((0, 1)));
        assert_eq!(range_bounds(3, 2, 1), None);
        assert_eq!(range_bounds(0, 0, -1), None);
        assert_eq!(range_bounds(3, 0, -10), None);
    }
}
