//! Hotbar ticker JSON cache.
//!
//! The hotbar widget reads a small JSON file of recent headlines. Feeds are
//! walked in configured priority order, each contributing up to
//! `per_feed_limit` entries, until `total_limit` is reached. Titles are
//! deduplicated case-insensitively across feeds. The entry date is the
//! published date when the feed carried one, else the run date.

use crate::config::HotbarConfig;
use crate::feeds::fetcher::fetch_feed_items;
use crate::models::{HotbarEntry, NewsItem};
use itertools::Itertools;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Fold per-feed item batches into the capped, deduplicated entry list.
///
/// Batches must arrive in feed priority order; earlier feeds win ties.
pub fn collect_entries(
    batches: &[Vec<NewsItem>],
    total_limit: usize,
    run_date: &str,
) -> Vec<HotbarEntry> {
    batches
        .iter()
        .flatten()
        .filter(|item| !item.title.is_empty())
        .unique_by(|item| item.title.to_lowercase())
        .take(total_limit)
        .map(|item| HotbarEntry {
            title: item.title.clone(),
            date: item
                .published
                .map(|p| p.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| run_date.to_string()),
        })
        .collect()
}

/// Fetch the hotbar feeds and write the ticker JSON.
///
/// Feeds are fetched sequentially to preserve priority order; a failed feed
/// is logged and skipped.
#[instrument(level = "info", skip_all, fields(feeds = config.feeds.len(), path = %path.display()))]
pub async fn build_hotbar(
    http: &reqwest::Client,
    config: &HotbarConfig,
    run_date: &str,
    path: &Path,
) -> Result<usize, Box<dyn Error>> {
    let mut batches: Vec<Vec<NewsItem>> = Vec::with_capacity(config.feeds.len());
    for url in &config.feeds {
        match fetch_feed_items(http, url, config.per_feed_limit).await {
            Ok(items) => batches.push(items),
            Err(e) => {
                warn!(%url, error = %e, "Hotbar feed failed; skipping");
            }
        }
    }

    let entries = collect_entries(&batches, config.total_limit, run_date);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(path, json).await?;

    info!(entries = entries.len(), "Wrote hotbar cache");
    Ok(entries.len())
}
