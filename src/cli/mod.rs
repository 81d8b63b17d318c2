//! Command-line interface: argument types and dispatch.

mod page;
mod values;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pagetrack::config::{Config, StoreBackend};
use pagetrack::store::{create_store, KvStore};

/// Expiring web page cache and per-URL access tracker.
#[derive(Parser, Debug)]
#[command(name = "pagetrack", version, about)]
pub struct Cli {
    /// Config file (default: ~/.pagetrack/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store backend override: redis or memory
    #[arg(long, global = true)]
    pub store: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a URL twice through the cache and report its access count (default)
    Demo {
        /// URL to fetch (default: demo_url from config)
        url: Option<String>,
    },
    /// Fetch one URL through the cache and print the page
    Get {
        url: String,
    },
    /// Print how many times a URL was fetched from the network
    Count {
        url: String,
    },
    /// Store a value under a new random key and print the key
    Stash {
        value: String,
        /// Store the value as an integer
        #[arg(long, conflicts_with = "float")]
        int: bool,
        /// Store the value as a float
        #[arg(long)]
        float: bool,
    },
    /// Show the recorded history of stash calls
    Replay,
}

/// Resolve config, build the store, and run the chosen command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let store = create_store(&config)
        .await
        .with_context(|| format!("Failed to open {:?} store", config.store))?;

    match cli.command.unwrap_or(Command::Demo { url: None }) {
        Command::Demo { url } => {
            let url = url.unwrap_or_else(|| config.demo_url.clone());
            page::cmd_demo(&config, store, &url).await
        }
        Command::Get { url } => page::cmd_get(&config, store, &url).await,
        Command::Count { url } => page::cmd_count(&config, store, &url).await,
        Command::Stash { value, int, float } => {
            values::cmd_stash(store, &value, int, float).await
        }
        Command::Replay => values::cmd_replay(store).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            dotenvy::dotenv().ok();
            let mut config = Config::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_overrides(|name| std::env::var(name).ok());
            config
        }
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(backend) = cli.store {
        config.store = backend;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Shared store handle type passed to command handlers.
pub(crate) type StoreHandle = Arc<dyn KvStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_no_command() {
        let cli = Cli::try_parse_from(["pagetrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.store.is_none());
    }

    #[test]
    fn test_cli_parses_store_override() {
        let cli = Cli::try_parse_from(["pagetrack", "get", "http://a.test", "--store", "memory"])
            .unwrap();
        assert_eq!(cli.store, Some(StoreBackend::Memory));
        assert!(matches!(cli.command, Some(Command::Get { ref url }) if url == "http://a.test"));
    }

    #[test]
    fn test_cli_rejects_unknown_store() {
        assert!(Cli::try_parse_from(["pagetrack", "--store", "postgres"]).is_err());
    }

    #[test]
    fn test_cli_stash_flags_conflict() {
        assert!(Cli::try_parse_from(["pagetrack", "stash", "1", "--int", "--float"]).is_err());
        let cli = Cli::try_parse_from(["pagetrack", "stash", "7", "--int"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Stash { int: true, float: false, .. })
        ));
    }

    #[test]
    fn test_load_config_applies_store_flag() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"cache": {"ttl_secs": 3}}"#).unwrap();
        let cli = Cli::try_parse_from([
            "pagetrack",
            "--config",
            path.to_str().unwrap(),
            "--store",
            "memory",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.cache.ttl_secs, 3);
    }
}
