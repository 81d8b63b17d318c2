//! Configuration for pagetrack.
//!
//! Loaded from `~/.pagetrack/config.json` when it exists, then overridden by
//! `PAGETRACK_*` environment variables (a `.env` file in the working
//! directory is honoured). Every field has a default, so an absent file is
//! not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrackError};

/// URL fetched by the demo command when none is given.
pub const DEFAULT_DEMO_URL: &str =
    "http://slowwly.robertomurray.co.uk/delay/5000/url/http://www.example.com";

/// Which key-value backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Networked Redis server (default).
    #[default]
    Redis,
    /// Process-local map; state is lost on exit.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(TrackError::Config(format!(
                "Unknown store backend '{}' (expected 'redis' or 'memory')",
                other
            ))),
        }
    }
}

/// Expiring cache and counter key settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds a fetched page stays cached.
    pub ttl_secs: u64,
    /// Prefix prepended to the URL to form the cache key.
    pub cache_prefix: String,
    /// Prefix prepended to the URL to form the access counter key.
    pub count_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 10,
            cache_prefix: "cache:".to_string(),
            count_prefix: "count:".to_string(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout. `None` leaves the client without one.
    pub timeout_secs: Option<u64>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Treat 4xx/5xx responses as fetch errors instead of returning the body.
    pub error_for_status: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: concat!("pagetrack/", env!("CARGO_PKG_VERSION")).to_string(),
            error_for_status: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreBackend,
    pub redis_url: String,
    pub cache: CacheSettings,
    pub http: HttpSettings,
    pub demo_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            cache: CacheSettings::default(),
            http: HttpSettings::default(),
            demo_url: DEFAULT_DEMO_URL.to_string(),
        }
    }
}

impl Config {
    /// `~/.pagetrack`
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagetrack")
    }

    /// `~/.pagetrack/config.json`
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default path, apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&data).map_err(|e| {
            TrackError::Config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Apply `PAGETRACK_*` overrides using `lookup` to read variables.
    ///
    /// Values that fail to parse are ignored and the file/default value kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("PAGETRACK_STORE").and_then(|v| v.parse().ok()) {
            self.store = backend;
        }
        if let Some(url) = lookup("PAGETRACK_REDIS_URL").filter(|v| !v.trim().is_empty()) {
            self.redis_url = url;
        }
        if let Some(ttl) = lookup("PAGETRACK_CACHE_TTL_SECS").and_then(|v| v.trim().parse().ok()) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(secs) = lookup("PAGETRACK_HTTP_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok())
        {
            self.http.timeout_secs = Some(secs);
        }
        if let Some(url) = lookup("PAGETRACK_DEMO_URL").filter(|v| !v.trim().is_empty()) {
            self.demo_url = url;
        }
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(TrackError::Config(
                "cache.ttl_secs must be at least 1".to_string(),
            ));
        }
        let cache = &self.cache.cache_prefix;
        let count = &self.cache.count_prefix;
        // Keys are prefix + URL, so overlapping prefixes are the only collision path.
        if cache.starts_with(count.as_str()) || count.starts_with(cache.as_str()) {
            return Err(TrackError::Config(format!(
                "cache_prefix '{}' and count_prefix '{}' overlap; cache and counter keys could collide",
                cache, count
            )));
        }
        Ok(())
    }
}
