//! Value store command handlers.

use anyhow::{Context, Result};

use pagetrack::values::{StoredValue, ValueStore};

use super::StoreHandle;

fn parse_value(raw: &str, int: bool, float: bool) -> Result<StoredValue> {
    if int {
        let n: i64 = raw
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not an integer", raw))?;
        return Ok(StoredValue::Int(n));
    }
    if float {
        let x: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a number", raw))?;
        return Ok(StoredValue::Float(x));
    }
    Ok(StoredValue::Text(raw.to_string()))
}

/// Handle `pagetrack stash`.
pub(crate) async fn cmd_stash(store: StoreHandle, raw: &str, int: bool, float: bool) -> Result<()> {
    let value = parse_value(raw, int, float)?;
    let key = ValueStore::new(store).store(value).await?;
    println!("{}", key);
    Ok(())
}

/// Handle `pagetrack replay`.
pub(crate) async fn cmd_replay(store: StoreHandle) -> Result<()> {
    let replay = ValueStore::new(store).replay().await?;
    println!("{}", replay);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetrack::store::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_parse_value_kinds() {
        assert_eq!(
            parse_value("hi", false, false).unwrap(),
            StoredValue::Text("hi".into())
        );
        assert_eq!(parse_value(" 12 ", true, false).unwrap(), StoredValue::Int(12));
        assert_eq!(parse_value("0.5", false, true).unwrap(), StoredValue::Float(0.5));
        assert!(parse_value("abc", true, false).is_err());
        assert!(parse_value("abc", false, true).is_err());
    }

    #[tokio::test]
    async fn test_stash_then_replay() {
        let store = Arc::new(MemoryStore::new());
        cmd_stash(store.clone(), "5", true, false).await.unwrap();
        let replay = ValueStore::new(store.clone()).replay().await.unwrap();
        assert_eq!(replay.calls, 1);
        assert_eq!(replay.entries[0].input, "(5,)");
        cmd_replay(store).await.unwrap();
    }
}
