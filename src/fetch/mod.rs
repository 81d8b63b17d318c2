//! Page sources.
//!
//! `PageSource` is the one capability every pipeline stage shares: take a
//! URL, return the page text. `HttpFetcher` is the leaf that goes to the
//! network; the counter and cache stages in `tracker` wrap another source.
//! `MockSource` stands in for the network in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::config::HttpSettings;
use crate::error::{Result, TrackError};

/// Anything that can turn a URL into page text.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<String>;
}

/// Fetches pages with a single HTTP GET.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    error_for_status: bool,
}

impl HttpFetcher {
    /// Build a fetcher from HTTP settings. No timeout is set unless
    /// `timeout_secs` is configured.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TrackError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
            error_for_status: settings.error_for_status,
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn get_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| TrackError::Fetch(format!("Request to '{}' failed: {}", url, e)))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "Fetched page");
        if self.error_for_status && !status.is_success() {
            return Err(TrackError::Fetch(format!(
                "Request to '{}' returned {}",
                url,
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| TrackError::Fetch(format!("Failed reading body of '{}': {}", url, e)))
    }
}

/// Mock source for tests: serves canned pages and counts calls.
#[cfg(test)]
pub struct MockSource {
    pub pages: std::sync::Mutex<std::collections::HashMap<String, String>>,
    pub calls: std::sync::atomic::AtomicUsize,
    pub fail: bool,
}

#[cfg(test)]
impl MockSource {
    pub fn new() -> Self {
        Self {
            pages: std::sync::Mutex::new(std::collections::HashMap::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl PageSource for MockSource {
    async fn get_page(&self, url: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        if self.fail {
            return Err(TrackError::Fetch(format!("mock failure for '{}'", url)));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| format!("<html>{} #{}</html>", url, n)))
    }
}
