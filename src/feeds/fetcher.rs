//! Concurrent feed fetching for a section.
//!
//! All feeds of a section are fetched through one bounded
//! `futures::stream::buffer_unordered` pass. A feed that fails to download
//! or parse is logged and skipped; the section keeps whatever the other
//! feeds produced.

use crate::config::SectionConfig;
use crate::feeds::{client, parser};
use crate::models::NewsItem;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{info, instrument, warn};

/// Feeds fetched in flight at once per section.
const CONCURRENT_FEEDS: usize = 4;

/// Download and parse one feed.
pub async fn fetch_feed_items(
    http: &reqwest::Client,
    url: &str,
    scan_limit: usize,
) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let bytes = client::fetch_feed_body(http, url).await?;
    parser::parse_items(&bytes, url, scan_limit)
}

/// Is the item recent enough for the digest?
///
/// Items without a publication date pass, matching the original behavior of
/// admitting undated entries.
pub fn within_horizon(item: &NewsItem, cutoff: DateTime<Utc>) -> bool {
    item.published.is_none_or(|p| p >= cutoff)
}

/// Fetch every feed of a section and pool the in-horizon items.
#[instrument(level = "info", skip_all, fields(section = %section.name))]
pub async fn fetch_section(
    http: &reqwest::Client,
    section: &SectionConfig,
    scan_limit: usize,
    cutoff: DateTime<Utc>,
) -> Vec<NewsItem> {
    let results: Vec<Vec<NewsItem>> = stream::iter(section.feeds.iter())
        .map(|url| async move {
            match fetch_feed_items(http, url, scan_limit).await {
                Ok(items) => {
                    info!(%url, count = items.len(), "Fetched feed");
                    items
                }
                Err(e) => {
                    warn!(%url, error = %e, "Feed fetch failed; skipping");
                    Vec::new()
                }
            }
        })
        .buffer_unordered(CONCURRENT_FEEDS)
        .collect()
        .await;

    let total: usize = results.iter().map(|r| r.len()).sum();
    let pool: Vec<NewsItem> = results
        .into_iter()
        .flatten()
        .filter(|item| within_horizon(item, cutoff))
        .collect();

    info!(
        fetched = total,
        in_horizon = pool.len(),
        "Section pool assembled"
    );
    pool
}
