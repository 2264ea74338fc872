//! RSS/Atom parsing and entry normalization.
//!
//! `feed-rs` handles both feed dialects. Each entry becomes a
//! [`NewsItem`] with whitespace-collapsed title, absolute link, optional
//! publication timestamp (`published` falling back to `updated`), and a
//! plain-text snippet with any embedded HTML stripped via `scraper`.
//!
//! Entries without a usable title or link are dropped here; everything else
//! is judged later by the horizon filter and the scorer.

use crate::models::NewsItem;
use crate::utils::{host_of, normalize_whitespace};
use scraper::Html;
use std::error::Error;
use tracing::{debug, instrument};

/// Parse a downloaded feed body into normalized items.
///
/// Reads at most `scan_limit` usable entries, mirroring the original scan
/// window of twice the section cap.
#[instrument(level = "debug", skip_all, fields(%feed_url))]
pub fn parse_items(
    bytes: &[u8],
    feed_url: &str,
    scan_limit: usize,
) -> Result<Vec<NewsItem>, Box<dyn Error>> {
    let feed = feed_rs::parser::parse(bytes)?;

    let mut items = Vec::new();
    for entry in feed.entries {
        if items.len() >= scan_limit {
            break;
        }

        let title = match entry.title {
            Some(t) => normalize_whitespace(&t.content),
            None => continue,
        };
        if title.is_empty() {
            continue;
        }

        let link = match entry.links.first() {
            Some(l) => l.href.clone(),
            None => continue,
        };

        let published = entry.published.or(entry.updated);
        let snippet = entry
            .summary
            .map(|s| normalize_whitespace(&strip_html(&s.content)))
            .unwrap_or_default();

        items.push(NewsItem {
            host: host_of(&link),
            title,
            link,
            published,
            snippet,
            score: 0.0,
            summary: None,
        });
    }

    debug!(count = items.len(), "Parsed feed entries");
    Ok(items)
}

/// Drop markup from a feed description, keeping its text content.
fn strip_html(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    fragment.root_element().text().collect::<Vec<_>>().join(" ")
}
