//! Per-method call counting and input/output history.
//!
//! A method named `N` keeps three keys: a counter at `N`, and the lists
//! `N:inputs` and `N:outputs`. [`replay`] reads them back.
//!
//! Inputs are recorded as the call's argument tuple, e.g. `("first",)`, and
//! replayed in splat form: `N(*("first",)) -> <output>`.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::store::KvStore;

/// Store-backed ledger for one qualified method name.
#[derive(Clone)]
pub struct MethodLedger {
    store: Arc<dyn KvStore>,
    name: String,
}

impl MethodLedger {
    pub fn new(store: Arc<dyn KvStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bump the call counter, returning the new count.
    pub async fn count_call(&self) -> Result<i64> {
        self.store.incr(&self.name).await
    }

    /// Append the rendered argument tuple of a call.
    pub async fn record_input(&self, input: &str) -> Result<()> {
        self.store
            .rpush(&inputs_key(&self.name), input.as_bytes())
            .await?;
        Ok(())
    }

    pub async fn record_output(&self, output: &str) -> Result<()> {
        self.store
            .rpush(&outputs_key(&self.name), output.as_bytes())
            .await?;
        Ok(())
    }
}

fn inputs_key(name: &str) -> String {
    format!("{}:inputs", name)
}

fn outputs_key(name: &str) -> String {
    format!("{}:outputs", name)
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEntry {
    pub input: String,
    pub output: String,
}

/// Call history of a method, as printed by `pagetrack replay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub name: String,
    pub calls: u64,
    pub entries: Vec<ReplayEntry>,
}

impl fmt::Display for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} was called {} times:", self.name, self.calls)?;
        for entry in &self.entries {
            write!(f, "\n{}(*{}) -> {}", self.name, entry.input, entry.output)?;
        }
        Ok(())
    }
}

/// Read back the count and history recorded for `name`.
///
/// A missing or non-numeric counter reads as 0. Inputs and outputs are
/// paired in order; unpaired trailing items are dropped and items that are
/// not UTF-8 render as empty strings.
pub async fn replay(store: &dyn KvStore, name: &str) -> Result<Replay> {
    let calls = store
        .get(name)
        .await?
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let inputs = store.lrange(&inputs_key(name), 0, -1).await?;
    let outputs = store.lrange(&outputs_key(name), 0, -1).await?;
    let entries = inputs
        .into_iter()
        .zip(outputs)
        .map(|(input, output)| ReplayEntry {
            input: String::from_utf8(input).unwrap_or_default(),
            output: String::from_utf8(output).unwrap_or_default(),
        })
        .collect();
    Ok(Replay {
        name: name.to_string(),
        calls,
        entries,
    })
}
