//! Disk-backed memoization for item summaries.
//!
//! The cache is a single JSON object mapping `"<normalized title>|<date>"`
//! to an [`ItemSummary`]. A headline that reappears unchanged on the same
//! date is never summarized twice. The map is loaded once at startup,
//! consulted and extended in memory during the run, and flushed to disk once
//! at the end.
//!
//! A missing or corrupt cache file starts the run with an empty map; losing
//! the cache only costs repeat API calls.

use crate::models::ItemSummary;
use crate::scoring::normalize_title;
use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Build the cache key for a headline on a given date (`YYYY-MM-DD`).
pub fn cache_key(title: &str, date: &str) -> String {
    format!("{}|{}", normalize_title(title), date)
}

/// In-memory summary cache bound to one JSON file.
#[derive(Debug)]
pub struct SummaryCache {
    path: PathBuf,
    entries: HashMap<String, ItemSummary>,
    /// Set when an entry was added since load; an unchanged cache is not
    /// rewritten.
    dirty: bool,
}

impl SummaryCache {
    /// Load the cache from `path`, starting empty when the file is missing
    /// or unreadable.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path).await {
            Ok(raw) => match serde_json::from_str::<HashMap<String, ItemSummary>>(&raw) {
                Ok(map) => {
                    info!(entries = map.len(), "Loaded summary cache");
                    map
                }
                Err(e) => {
                    warn!(error = %e, "Summary cache unreadable; starting empty");
                    HashMap::new()
                }
            },
            Err(_) => {
                info!("No summary cache yet; starting empty");
                HashMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    /// Look up a cached summary for a headline/date pair.
    pub fn get(&self, title: &str, date: &str) -> Option<&ItemSummary> {
        self.entries.get(&cache_key(title, date))
    }

    /// Record a fresh summary.
    pub fn insert(&mut self, title: &str, date: &str, summary: ItemSummary) {
        self.entries.insert(cache_key(title, date), summary);
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache back to disk when anything was added.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn flush(&self) -> Result<(), Box<dyn Error>> {
        if !self.dirty {
            info!("Summary cache unchanged; skipping flush");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).await?;
        info!(entries = self.entries.len(), "Flushed summary cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(text: &str) -> ItemSummary {
        ItemSummary {
            text: text.to_string(),
            disputed: None,
        }
    }

    #[test]
    fn test_cache_key_is_normalized() {
        assert_eq!(
            cache_key("  Storm HITS the coast! ", "2025-05-06"),
            "storm hits the coast|2025-05-06"
        );
        // Same headline, different punctuation, same key.
        assert_eq!(
            cache_key("Storm hits the coast", "2025-05-06"),
            cache_key("Storm: hits, the coast", "2025-05-06")
        );
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let cache = SummaryCache::load(Path::new("/nonexistent/dir/cache.json")).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let dir = std::env::temp_dir().join("briefrooms_cache_test");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        let path = dir.join("summaries.json");

        let mut cache = SummaryCache::load(&path).await;
        cache.insert("Storm hits the coast", "2025-05-06", summary("Short summary."));
        cache.flush().await.unwrap();

        let reloaded = SummaryCache::load(&path).await;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.get("Storm hits the coast", "2025-05-06").unwrap().text,
            "Short summary."
        );
        // Different date misses.
        assert!(reloaded.get("Storm hits the coast", "2025-05-07").is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = std::env::temp_dir().join("briefrooms_cache_corrupt_test");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("summaries.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let cache = SummaryCache::load(&path).await;
        assert!(cache.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
