//! Page fetch and counter command handlers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use pagetrack::config::Config;
use pagetrack::fetch::HttpFetcher;
use pagetrack::tracker::PageTracker;

use super::StoreHandle;

fn build_tracker(config: &Config, store: StoreHandle) -> Result<PageTracker> {
    let fetcher = HttpFetcher::new(&config.http).context("Failed to build HTTP client")?;
    Ok(PageTracker::new(store, Arc::new(fetcher), &config.cache))
}

/// Handle `pagetrack demo`: fetch twice, print both pages and the count.
pub(crate) async fn cmd_demo(config: &Config, store: StoreHandle, url: &str) -> Result<()> {
    let tracker = build_tracker(config, store)?;
    run_demo(&tracker, url, &mut std::io::stdout()).await
}

async fn run_demo<W: Write>(tracker: &PageTracker, url: &str, out: &mut W) -> Result<()> {
    for _ in 0..2 {
        let page = tracker
            .get_page(url)
            .await
            .with_context(|| format!("Failed to get page {}", url))?;
        writeln!(out, "{}", page)?;
    }
    let count = tracker.access_count(url).await?;
    writeln!(out, "URL {} was accessed {} times.", url, count)?;

    let stats = tracker.stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        hit_rate = stats.hit_rate(),
        "Cache stats"
    );
    Ok(())
}

/// Handle `pagetrack get`.
pub(crate) async fn cmd_get(config: &Config, store: StoreHandle, url: &str) -> Result<()> {
    let tracker = build_tracker(config, store)?;
    let page = tracker
        .get_page(url)
        .await
        .with_context(|| format!("Failed to get page {}", url))?;
    println!("{}", page);
    Ok(())
}

/// Handle `pagetrack count`.
pub(crate) async fn cmd_count(config: &Config, store: StoreHandle, url: &str) -> Result<()> {
    let tracker = build_tracker(config, store)?;
    let count = tracker.access_count(url).await?;
    println!("URL {} was accessed {} times.", url, count);
    Ok(())
}
