//! Data models for feed entries and the rendered digest.
//!
//! This module defines the core data structures used throughout the
//! application:
//! - [`NewsItem`]: one normalized feed entry with its derived score
//! - [`ItemSummary`]: optional LLM-produced summary and disputed note
//! - [`SectionDigest`] / [`DigestPage`]: the selected items for one run
//! - [`HotbarEntry`]: one line of the ticker JSON cache
//!
//! Items are ephemeral: they are rebuilt from the live feeds on every run
//! and discarded after rendering. The only state that survives a run is the
//! summary cache, keyed by normalized title and date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized feed entry.
///
/// Produced by the feed parser, scored by [`crate::scoring::Scorer`], and
/// optionally annotated with a summary before rendering.
#[derive(Debug, Clone)]
pub struct NewsItem {
    /// Headline with whitespace collapsed.
    pub title: String,
    /// Absolute link to the publisher's article.
    pub link: String,
    /// Publication timestamp, when the feed provided one.
    pub published: Option<DateTime<Utc>>,
    /// Plain-text description snippet (HTML stripped, truncated).
    pub snippet: String,
    /// Source host, e.g. `www.reuters.com`.
    pub host: String,
    /// Composite relevance score; higher sorts first.
    pub score: f64,
    /// Filled in by the summarizer step when enabled.
    pub summary: Option<ItemSummary>,
}

impl NewsItem {
    /// Age of the item relative to `now`, in fractional hours.
    ///
    /// Returns `None` when the feed did not carry a publication date.
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.published
            .map(|p| (now - p).num_seconds() as f64 / 3600.0)
    }
}

/// An LLM-produced summary for a selected item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSummary {
    /// One- or two-sentence summary of the headline and snippet.
    pub text: String,
    /// Short note when the story is contested or uncertain, e.g.
    /// "casualty figures disputed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disputed: Option<String>,
}

/// The selected items for one named section of the digest.
#[derive(Debug)]
pub struct SectionDigest {
    /// Display name, e.g. "World" or "Ekonomia / Biznes".
    pub name: String,
    /// Anchor id for the rendered section.
    pub slug: String,
    /// Items in final display order.
    pub items: Vec<NewsItem>,
}

/// Everything the HTML renderer needs for one digest page.
#[derive(Debug)]
pub struct DigestPage {
    /// Site name shown in the title and footer.
    pub site_name: String,
    /// BCP 47 language tag for the `<html lang>` attribute.
    pub language: String,
    /// Horizon in hours, shown in the subtitle.
    pub horizon_hours: i64,
    /// Local date of generation, `YYYY-MM-DD`.
    pub local_date: String,
    /// Sections in configured order; empty sections are skipped by the
    /// renderer.
    pub sections: Vec<SectionDigest>,
}

/// One entry of the hotbar ticker JSON cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotbarEntry {
    pub title: String,
    /// Publication date `YYYY-MM-DD`, falling back to the run date when the
    /// feed carried none.
    pub date: String,
}
