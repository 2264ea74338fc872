//! Item scoring, deduplication, and per-section selection.
//!
//! The score of an item combines three terms:
//!
//! 1. recency decay: `recency_weight * 2^(-age_hours / half_life)`
//! 2. keyword boosts: sum of weights for configured regexes the title matches
//! 3. source weight: a flat per-host weight from the config
//!
//! Items without a publication date are scored as if they were half a
//! horizon old, so dated fresh stories outrank them but they are not
//! discarded.
//!
//! Selection sorts by score descending and greedily fills a section up to
//! `max_per_section`, skipping duplicates (normalized-title exact match or
//! title-token Jaccard similarity at or above the threshold) and anything
//! past the per-host cap. The sports section gets a prioritization pass
//! first: items matching the live pattern or a favorite pattern are moved
//! ahead of the generic fill.

use crate::config::{ScoringConfig, SportsConfig};
use crate::models::NewsItem;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use tracing::{debug, instrument};

/// Normalize a title for exact-duplicate comparison: lowercase, punctuation
/// stripped, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token set of a normalized title, for Jaccard comparison.
pub fn title_tokens(title: &str) -> HashSet<String> {
    normalize_title(title)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard similarity |A ∩ B| / |A ∪ B| of two token sets.
///
/// Two empty sets compare as identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Compiled scoring rules for one run.
pub struct Scorer {
    boosts: Vec<(Regex, f64)>,
    source_weights: HashMap<String, f64>,
    recency_half_life_hours: f64,
    recency_weight: f64,
    /// Age assumed for items whose feed carried no date.
    undated_age_hours: f64,
    now: DateTime<Utc>,
}

impl Scorer {
    /// Compile the configured boost patterns. A bad pattern fails the run
    /// here, before any feed is fetched.
    pub fn new(
        scoring: &ScoringConfig,
        horizon_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, Box<dyn Error>> {
        let mut boosts = Vec::with_capacity(scoring.keyword_boosts.len());
        for boost in &scoring.keyword_boosts {
            boosts.push((Regex::new(&boost.pattern)?, boost.weight));
        }
        Ok(Self {
            boosts,
            source_weights: scoring.source_weights.clone(),
            recency_half_life_hours: scoring.recency_half_life_hours,
            recency_weight: scoring.recency_weight,
            undated_age_hours: horizon_hours as f64 / 2.0,
            now,
        })
    }

    /// Compute the composite score for one item.
    pub fn score(&self, item: &NewsItem) -> f64 {
        let age_hours = item
            .age_hours(self.now)
            .unwrap_or(self.undated_age_hours)
            .max(0.0);
        let recency = self.recency_weight * (-age_hours / self.recency_half_life_hours).exp2();

        let boost: f64 = self
            .boosts
            .iter()
            .filter(|(re, _)| re.is_match(&item.title))
            .map(|(_, w)| w)
            .sum();

        let source = self.source_weights.get(&item.host).copied().unwrap_or(0.0);

        recency + boost + source
    }

    /// Score a batch in place.
    pub fn score_all(&self, items: &mut [NewsItem]) {
        for item in items.iter_mut() {
            item.score = self.score(item);
        }
    }
}

/// Compiled sports prioritization: live coverage and favorites go first.
pub struct SportsPriority {
    section: String,
    live: Regex,
    favorites: Vec<Regex>,
}

impl SportsPriority {
    pub fn new(config: &SportsConfig) -> Result<Self, Box<dyn Error>> {
        let live = Regex::new(&config.live_pattern)?;
        let mut favorites = Vec::with_capacity(config.favorites.len());
        for pattern in &config.favorites {
            favorites.push(Regex::new(pattern)?);
        }
        Ok(Self {
            section: config.section.clone(),
            live,
            favorites,
        })
    }

    /// Does this prioritization apply to the named section?
    pub fn applies_to(&self, section_name: &str) -> bool {
        self.section == section_name
    }

    /// Is the item live coverage or about a favorite entity?
    pub fn is_priority(&self, item: &NewsItem) -> bool {
        self.live.is_match(&item.title) || self.favorites.iter().any(|re| re.is_match(&item.title))
    }
}

/// Selection caps for one section.
#[derive(Debug, Clone, Copy)]
pub struct SelectionLimits {
    pub max_per_section: usize,
    pub max_per_host: usize,
    pub jaccard_threshold: f64,
}

/// Pick the items for one section.
///
/// Sorts by score descending (prioritized items first when `sports` applies)
/// and greedily keeps items while enforcing the duplicate and host caps.
/// The result upholds the section invariants: no two kept items share a
/// normalized title or reach the Jaccard threshold, no host exceeds its cap,
/// and the section cap bounds the total.
#[instrument(level = "debug", skip_all, fields(section = %section_name, pool = items.len()))]
pub fn select_section(
    section_name: &str,
    mut items: Vec<NewsItem>,
    limits: SelectionLimits,
    sports: Option<&SportsPriority>,
) -> Vec<NewsItem> {
    items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    // Stable partition keeps the score order inside each half.
    if let Some(sports) = sports.filter(|s| s.applies_to(section_name)) {
        let (priority, rest): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| sports.is_priority(item));
        debug!(priority = priority.len(), "Sports prioritization applied");
        items = priority;
        items.extend(rest);
    }

    let mut kept: Vec<NewsItem> = Vec::with_capacity(limits.max_per_section);
    let mut kept_tokens: Vec<HashSet<String>> = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut host_counts: HashMap<String, usize> = HashMap::new();

    for item in items {
        if kept.len() >= limits.max_per_section {
            break;
        }

        let normalized = normalize_title(&item.title);
        if normalized.is_empty() || seen_titles.contains(&normalized) {
            debug!(title = %item.title, "Skipping exact duplicate or empty title");
            continue;
        }

        let tokens = title_tokens(&item.title);
        if kept_tokens
            .iter()
            .any(|k| jaccard(k, &tokens) >= limits.jaccard_threshold)
        {
            debug!(title = %item.title, "Skipping near-duplicate title");
            continue;
        }

        let host_count = host_counts.get(&item.host).copied().unwrap_or(0);
        if host_count >= limits.max_per_host {
            debug!(title = %item.title, host = %item.host, "Host cap reached");
            continue;
        }

        seen_titles.insert(normalized);
        kept_tokens.push(tokens);
        *host_counts.entry(item.host.clone()).or_insert(0) += 1;
        kept.push(item);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeywordBoost;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn item(title: &str, host: &str, age_hours: i64, score: f64) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: format!("https://{}/{}", host, normalize_title(title).replace(' ', "-")),
            published: Some(now() - chrono::Duration::hours(age_hours)),
            snippet: String::new(),
            host: host.to_string(),
            score,
            summary: None,
        }
    }

    fn limits() -> SelectionLimits {
        SelectionLimits {
            max_per_section: 4,
            max_per_host: 2,
            jaccard_threshold: 0.55,
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Breaking: Storm Hits!  "), "breaking storm hits");
        assert_eq!(normalize_title("Trump-Xi 'situationship'"), "trump xi situationship");
        assert_eq!(normalize_title("!!!"), "");
    }

    #[test]
    fn test_jaccard() {
        let a = title_tokens("storm hits the coast");
        let b = title_tokens("storm hits the coast again");
        // 4 shared of 5 total
        assert!((jaccard(&a, &b) - 0.8).abs() < 1e-9);
        let c = title_tokens("completely different words");
        assert_eq!(jaccard(&a, &c), 0.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 1.0);
    }

    #[test]
    fn test_scorer_recency_decay() {
        let scoring = ScoringConfig::default();
        let scorer = Scorer::new(&scoring, 36, now()).unwrap();
        let fresh = scorer.score(&item("a b c", "x.com", 0, 0.0));
        let half_life_old = scorer.score(&item("d e f", "x.com", 12, 0.0));
        let stale = scorer.score(&item("g h i", "x.com", 24, 0.0));
        assert!(fresh > half_life_old);
        assert!(half_life_old > stale);
        // One half-life halves the recency term.
        assert!((half_life_old * 2.0 - fresh).abs() < 1e-9);
    }

    #[test]
    fn test_scorer_undated_is_half_horizon_old() {
        let scoring = ScoringConfig::default();
        let scorer = Scorer::new(&scoring, 36, now()).unwrap();
        let mut undated = item("a b c", "x.com", 0, 0.0);
        undated.published = None;
        let dated_18h = item("d e f", "x.com", 18, 0.0);
        assert!((scorer.score(&undated) - scorer.score(&dated_18h)).abs() < 1e-9);
    }

    #[test]
    fn test_scorer_boosts_and_source_weight() {
        let mut scoring = ScoringConfig::default();
        scoring.keyword_boosts.push(KeywordBoost {
            pattern: r"(?i)\bbreaking\b".to_string(),
            weight: 2.0,
        });
        scoring.source_weights.insert("trusted.com".to_string(), 1.5);
        let scorer = Scorer::new(&scoring, 36, now()).unwrap();

        let plain = scorer.score(&item("quiet day in parliament", "x.com", 6, 0.0));
        let boosted = scorer.score(&item("Breaking: quiet day in parliament", "x.com", 6, 0.0));
        let weighted = scorer.score(&item("quiet day in parliament", "trusted.com", 6, 0.0));
        assert!((boosted - plain - 2.0).abs() < 1e-9);
        assert!((weighted - plain - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_scorer_rejects_bad_pattern() {
        let mut scoring = ScoringConfig::default();
        scoring.keyword_boosts.push(KeywordBoost {
            pattern: "(unclosed".to_string(),
            weight: 1.0,
        });
        assert!(Scorer::new(&scoring, 36, now()).is_err());
    }

    #[test]
    fn test_select_drops_exact_duplicates() {
        let items = vec![
            item("Storm hits the coast", "a.com", 1, 5.0),
            item("storm hits the coast!", "b.com", 2, 4.0),
            item("Parliament votes on budget", "c.com", 3, 3.0),
        ];
        let kept = select_section("World", items, limits(), None);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "Storm hits the coast");
        assert_eq!(kept[1].title, "Parliament votes on budget");
    }

    #[test]
    fn test_select_drops_near_duplicates() {
        let items = vec![
            item("Storm hits the northern coast", "a.com", 1, 5.0),
            item("Storm hits the northern coast again", "b.com", 2, 4.0),
            item("Central bank raises interest rates", "c.com", 3, 3.0),
        ];
        let kept = select_section("World", items, limits(), None);
        assert_eq!(kept.len(), 2);
        // The pairwise invariant holds for everything kept.
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                let sim = jaccard(&title_tokens(&a.title), &title_tokens(&b.title));
                assert!(sim < limits().jaccard_threshold);
            }
        }
    }

    #[test]
    fn test_select_enforces_host_cap() {
        let items = vec![
            item("First headline entirely", "a.com", 1, 5.0),
            item("Second story wholly different", "a.com", 2, 4.0),
            item("Third report nothing alike", "a.com", 3, 3.0),
            item("Fourth bulletin other outlet", "b.com", 4, 2.0),
        ];
        let kept = select_section("World", items, limits(), None);
        assert_eq!(kept.len(), 3);
        let from_a = kept.iter().filter(|i| i.host == "a.com").count();
        assert_eq!(from_a, 2);
    }

    #[test]
    fn test_select_enforces_section_cap() {
        let items = (0..10)
            .map(|i| {
                item(
                    &format!("unique headline number {} entirely", i),
                    &format!("host{}.com", i),
                    1,
                    10.0 - i as f64,
                )
            })
            .collect();
        let kept = select_section("World", items, limits(), None);
        assert_eq!(kept.len(), limits().max_per_section);
    }

    #[test]
    fn test_select_orders_by_score() {
        let items = vec![
            item("Low priority filler story", "a.com", 1, 1.0),
            item("Top scored breaking report", "b.com", 1, 9.0),
            item("Middle ranked account piece", "c.com", 1, 5.0),
        ];
        let kept = select_section("World", items, limits(), None);
        let scores: Vec<f64> = kept.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![9.0, 5.0, 1.0]);
    }

    #[test]
    fn test_sports_priority_first() {
        let sports = SportsPriority::new(&SportsConfig {
            section: "Sports".to_string(),
            live_pattern: r"(?i)\blive\b".to_string(),
            favorites: vec![r"(?i)\blegia\b".to_string()],
        })
        .unwrap();

        let items = vec![
            item("Transfer rumor roundup today", "a.com", 1, 9.0),
            item("LIVE: cup final underway", "b.com", 1, 2.0),
            item("Legia appoints new manager", "c.com", 1, 1.0),
        ];
        let kept = select_section("Sports", items, limits(), Some(&sports));
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].title, "LIVE: cup final underway");
        assert_eq!(kept[1].title, "Legia appoints new manager");
        assert_eq!(kept[2].title, "Transfer rumor roundup today");
    }

    #[test]
    fn test_sports_priority_other_section_unaffected() {
        let sports = SportsPriority::new(&SportsConfig {
            section: "Sports".to_string(),
            live_pattern: r"(?i)\blive\b".to_string(),
            favorites: vec![],
        })
        .unwrap();

        let items = vec![
            item("Quiet debate in parliament", "a.com", 1, 9.0),
            item("LIVE: press conference stream", "b.com", 1, 2.0),
        ];
        let kept = select_section("World", items, limits(), Some(&sports));
        assert_eq!(kept[0].title, "Quiet debate in parliament");
    }
}
