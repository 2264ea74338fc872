//! # BriefRooms News
//!
//! A news digest pipeline that polls RSS/Atom feeds, scores and deduplicates
//! headlines, optionally summarizes the selection through an
//! OpenAI-compatible LLM API, and writes a static HTML digest page plus a
//! small JSON cache for the hotbar ticker widget.
//!
//! ## Features
//!
//! - Config-driven editions: one YAML file per digest page (sections, feeds,
//!   scoring rules, caps, output paths)
//! - Composite scoring: recency decay, keyword boosts, source weights
//! - Duplicate suppression by normalized title and token-set Jaccard
//!   similarity, with per-host and per-section caps
//! - Sports prioritization: live coverage and favorites ahead of the fill
//! - Optional LLM summaries with a disk-backed title+date cache
//!
//! ## Usage
//!
//! ```sh
//! briefrooms_news -c editions/en.yaml -o ./site
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: download each section's feeds concurrently
//! 2. **Selection**: score, dedupe, and cap the pooled items
//! 3. **Summarization**: LLM summaries for the selection (optional, cached)
//! 4. **Output**: write the digest HTML and the hotbar JSON

use chrono::{Duration, Local, Utc};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod feeds;
mod models;
mod outputs;
mod scoring;
mod summarizer;
mod utils;

use cache::SummaryCache;
use cli::Cli;
use config::Config;
use models::{DigestPage, SectionDigest};
use scoring::{Scorer, SelectionLimits, SportsPriority};
use summarizer::OpenAiChat;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("briefrooms_news starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output_dir, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        warn!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // --- Load config and compile the scoring rules ---
    let config = Config::load(&args.config).await?;

    let now = Utc::now();
    let cutoff = now - Duration::hours(config.horizon_hours);
    let run_date = Local::now().date_naive().to_string();
    info!(%run_date, horizon_hours = config.horizon_hours, "Run window computed");

    let scorer = Scorer::new(&config.scoring, config.horizon_hours, now)?;
    let sports = match &config.sports {
        Some(sports_config) => Some(SportsPriority::new(sports_config)?),
        None => None,
    };
    let limits = SelectionLimits {
        max_per_section: config.max_per_section,
        max_per_host: config.max_per_host,
        jaccard_threshold: config.jaccard_threshold,
    };

    let http = feeds::client::build_client()?;

    // ---- Fetch and select per section ----
    let scan_limit = config.scan_per_feed();
    let mut sections: Vec<SectionDigest> = Vec::with_capacity(config.sections.len());
    for section_config in &config.sections {
        let mut pool =
            feeds::fetcher::fetch_section(&http, section_config, scan_limit, cutoff).await;
        scorer.score_all(&mut pool);
        let selected =
            scoring::select_section(&section_config.name, pool, limits, sports.as_ref());
        info!(
            section = %section_config.name,
            selected = selected.len(),
            "Section selected"
        );
        sections.push(SectionDigest {
            name: section_config.name.clone(),
            slug: section_config.slug.clone(),
            items: selected,
        });
    }

    let total_selected: usize = sections.iter().map(|s| s.items.len()).sum();
    info!(total = total_selected, "Selection complete");

    // ---- Summarize (optional) ----
    let summarize = !args.no_summaries && args.api_key.is_some();
    if summarize {
        let model = args
            .model
            .clone()
            .unwrap_or_else(|| config.summaries.model.clone());
        let chat = OpenAiChat::new(
            http.clone(),
            args.api_base_url.clone(),
            args.api_key.clone().unwrap_or_default(),
            model.clone(),
        );
        let cache_path = Path::new(&args.output_dir).join(&config.summaries.cache_file);
        let mut cache = SummaryCache::load(&cache_path).await;

        info!(%model, "Summarizing selected items");
        for section in &mut sections {
            summarizer::summarize_items(
                &chat,
                &mut cache,
                &mut section.items,
                &run_date,
                config.summaries.max_snippet_chars,
            )
            .await;
        }

        if let Err(e) = cache.flush().await {
            warn!(error = %e, "Failed to flush summary cache");
        }
    } else {
        info!("Summarization disabled (no API key or --no-summaries)");
    }

    // ---- Digest page ----
    let page = DigestPage {
        site_name: config.site_name.clone(),
        language: config.language.clone(),
        horizon_hours: config.horizon_hours,
        local_date: run_date.clone(),
        sections,
    };
    let html_path = Path::new(&args.output_dir).join(&config.html_file);
    outputs::html::write_digest(&page, &html_path).await?;

    // ---- Hotbar ----
    if args.no_hotbar {
        info!("Hotbar generation disabled (--no-hotbar)");
    } else if let Some(hotbar_config) = &config.hotbar {
        let hotbar_path = Path::new(&args.output_dir).join(&hotbar_config.file);
        match outputs::hotbar::build_hotbar(&http, hotbar_config, &run_date, &hotbar_path).await {
            Ok(count) => info!(entries = count, "Hotbar cache written"),
            Err(e) => warn!(error = %e, "Failed to write hotbar cache"),
        }
    } else {
        debug!("No hotbar configured");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = total_selected,
        "Execution complete"
    );

    Ok(())
}
