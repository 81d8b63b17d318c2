//! Scalar value store with call accounting.
//!
//! `ValueStore::store` writes a value under a fresh UUID key and returns the
//! key. Each call is counted and its input and output appended to the
//! method's history (see [`ledger`]), which `replay` prints back.

pub mod ledger;

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TrackError};
use crate::store::KvStore;

pub use ledger::{replay, MethodLedger, Replay, ReplayEntry};

/// Ledger name for [`ValueStore::store`].
pub const STORE_METHOD: &str = "ValueStore.store";

/// A value accepted by [`ValueStore::store`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl StoredValue {
    /// Wire form: text and bytes as-is, numbers in decimal.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            StoredValue::Text(s) => s.as_bytes().to_vec(),
            StoredValue::Bytes(b) => b.clone(),
            StoredValue::Int(n) => n.to_string().into_bytes(),
            StoredValue::Float(x) => format!("{:?}", x).into_bytes(),
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Text(s) => write!(f, "{:?}", s),
            StoredValue::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            StoredValue::Int(n) => write!(f, "{}", n),
            StoredValue::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<&str> for StoredValue {
    fn from(s: &str) -> Self {
        StoredValue::Text(s.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        StoredValue::Text(s)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(b: Vec<u8>) -> Self {
        StoredValue::Bytes(b)
    }
}

impl From<i64> for StoredValue {
    fn from(n: i64) -> Self {
        StoredValue::Int(n)
    }
}

impl From<f64> for StoredValue {
    fn from(x: f64) -> Self {
        StoredValue::Float(x)
    }
}

/// Writes values under random keys and reads them back.
pub struct ValueStore {
    store: Arc<dyn KvStore>,
    ledger: MethodLedger,
}

impl ValueStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let ledger = MethodLedger::new(store.clone(), STORE_METHOD);
        Self { store, ledger }
    }

    /// Drop every key in the store's database, history included.
    pub async fn reset(&self) -> Result<()> {
        self.store.flush_db().await
    }

    /// Store `value` under a new UUID v4 key and return the key.
    ///
    /// The input is recorded before the write and the key after it, so a
    /// failed write leaves an input with no matching output.
    pub async fn store(&self, value: impl Into<StoredValue>) -> Result<String> {
        let value = value.into();
        self.ledger.record_input(&format!("({},)", value)).await?;
        self.ledger.count_call().await?;

        let key = Uuid::new_v4().to_string();
        self.store.set(&key, &value.to_bytes()).await?;
        debug!(key = %key, "Stored value");

        self.ledger.record_output(&key).await?;
        Ok(key)
    }

    /// Raw bytes under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(key).await
    }

    /// Bytes under `key` passed through `convert`.
    pub async fn get_with<T, F>(&self, key: &str, convert: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> T + Send,
    {
        Ok(self.store.get(key).await?.map(convert))
    }

    /// UTF-8 text under `key`.
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        match self.store.get(key).await? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                TrackError::Decode(format!("Value under '{}' is not UTF-8: {}", key, e))
            }),
        }
    }

    /// Integer under `key`; missing or non-numeric values read as 0.
    pub async fn get_int(&self, key: &str) -> Result<i64> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0))
    }

    /// History of [`ValueStore::store`] calls.
    pub async fn replay(&self) -> Result<Replay> {
        replay(self.store.as_ref(), self.ledger.name()).await
    }
}
