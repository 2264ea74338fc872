//! Edition configuration loaded from a YAML file.
//!
//! One YAML file describes one digest "edition" (the original site shipped
//! separate English and Polish variants; here each is just a config). The
//! file lists the sections and their feed URLs, the scoring rules, the
//! selection caps, the optional sports prioritization, the hotbar feed list,
//! and the output paths.
//!
//! Regex patterns referenced by the config are compiled by
//! [`crate::scoring::Scorer::new`] right after loading, so a bad pattern
//! fails the run before any network traffic.

use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use tracing::{info, instrument};

/// Top-level edition configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Site name shown in the page title and footer.
    pub site_name: String,
    /// BCP 47 language tag for the rendered page, e.g. `en` or `pl`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Only items published within the last N hours are kept. Items without
    /// a date pass the filter.
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: i64,
    /// Maximum items kept per section.
    #[serde(default = "default_max_per_section")]
    pub max_per_section: usize,
    /// Maximum items a single host may contribute to one section.
    #[serde(default = "default_max_per_host")]
    pub max_per_host: usize,
    /// How many entries to read from each feed before filtering. Defaults to
    /// `2 * max_per_section`, matching the original scan window.
    #[serde(default)]
    pub scan_per_feed: Option<usize>,
    /// Title token sets at or above this Jaccard similarity are duplicates.
    #[serde(default = "default_jaccard_threshold")]
    pub jaccard_threshold: f64,
    /// Sections in display order.
    pub sections: Vec<SectionConfig>,
    /// Scoring knobs; all have defaults.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Optional sports prioritization (live events and favorites first).
    #[serde(default)]
    pub sports: Option<SportsConfig>,
    /// Optional hotbar ticker output.
    #[serde(default)]
    pub hotbar: Option<HotbarConfig>,
    /// Digest HTML path, relative to `--output-dir`.
    pub html_file: String,
    /// Summarization settings; only used when an API key is configured.
    #[serde(default)]
    pub summaries: SummariesConfig,
}

/// One named bucket of feeds, e.g. "World" or "Sport".
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    /// Stable identifier used for HTML anchors.
    pub slug: String,
    /// RSS/Atom URLs polled for this section.
    pub feeds: Vec<String>,
}

/// Weights feeding the composite item score.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Recency decay half-life in hours.
    #[serde(default = "default_half_life")]
    pub recency_half_life_hours: f64,
    /// Multiplier applied to the decayed recency term.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,
    /// Regex patterns that add their weight to the score when the title
    /// matches.
    #[serde(default)]
    pub keyword_boosts: Vec<KeywordBoost>,
    /// Flat per-host weight added to the score, keyed by feed host.
    #[serde(default)]
    pub source_weights: HashMap<String, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            recency_half_life_hours: default_half_life(),
            recency_weight: default_recency_weight(),
            keyword_boosts: Vec::new(),
            source_weights: HashMap::new(),
        }
    }
}

/// One keyword boost rule.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordBoost {
    /// Regex matched against the normalized title.
    pub pattern: String,
    pub weight: f64,
}

/// Sports-section prioritization: live coverage and favorite entities are
/// placed ahead of the generic fill.
#[derive(Debug, Clone, Deserialize)]
pub struct SportsConfig {
    /// Name of the section this applies to (must match a `sections` entry).
    pub section: String,
    /// Regex marking live coverage, e.g. `(?i)\blive\b|\bna żywo\b`.
    #[serde(default = "default_live_pattern")]
    pub live_pattern: String,
    /// Regexes for favorite teams, athletes, or competitions.
    #[serde(default)]
    pub favorites: Vec<String>,
}

/// Hotbar ticker JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct HotbarConfig {
    /// Feeds scanned for the ticker, in priority order.
    pub feeds: Vec<String>,
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    #[serde(default = "default_total_limit")]
    pub total_limit: usize,
    /// Output path relative to `--output-dir`.
    #[serde(default = "default_hotbar_file")]
    pub file: String,
}

/// LLM summarization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SummariesConfig {
    /// Model name; overridable with the `NEWS_MODEL` environment variable.
    #[serde(default = "default_model")]
    pub model: String,
    /// Summary cache path relative to `--output-dir`.
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    /// Snippet length cap for prompts and fallback summaries.
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: usize,
}

impl Default for SummariesConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            cache_file: default_cache_file(),
            max_snippet_chars: default_max_snippet_chars(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}
fn default_horizon_hours() -> i64 {
    36
}
fn default_max_per_section() -> usize {
    6
}
fn default_max_per_host() -> usize {
    2
}
fn default_jaccard_threshold() -> f64 {
    0.55
}
fn default_half_life() -> f64 {
    12.0
}
fn default_recency_weight() -> f64 {
    3.0
}
fn default_live_pattern() -> String {
    r"(?i)\blive\b".to_string()
}
fn default_per_feed_limit() -> usize {
    15
}
fn default_total_limit() -> usize {
    40
}
fn default_hotbar_file() -> String {
    "cache/hotbar.json".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_cache_file() -> String {
    ".cache/news_summaries.json".to_string()
}
fn default_max_snippet_chars() -> usize {
    400
}

impl Config {
    /// Load and deserialize an edition config from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path))]
    pub async fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&raw)?;
        if config.sections.is_empty() {
            return Err("config has no sections".into());
        }
        info!(
            sections = config.sections.len(),
            horizon_hours = config.horizon_hours,
            "Loaded edition config"
        );
        Ok(config)
    }

    /// Entries read per feed before filtering.
    pub fn scan_per_feed(&self) -> usize {
        self.scan_per_feed.unwrap_or(self.max_per_section * 2)
    }
}
