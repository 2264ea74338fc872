//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap`
//! crate. The API credentials come from the environment; everything about
//! the edition itself lives in the YAML config.

use clap::Parser;

/// Command-line arguments for the digest generator.
///
/// # Examples
///
/// ```sh
/// # English edition into ./site
/// briefrooms_news -c editions/en.yaml -o ./site
///
/// # With summarization (key picked up from the environment)
/// OPENAI_API_KEY=sk-... briefrooms_news -c editions/en.yaml -o ./site
///
/// # Digest only, no hotbar, no LLM calls
/// briefrooms_news -c editions/pl.yaml -o ./site --no-hotbar --no-summaries
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Edition config YAML
    #[arg(short, long)]
    pub config: String,

    /// Root directory for generated files (HTML, hotbar JSON, summary cache)
    #[arg(short, long)]
    pub output_dir: String,

    /// Skip the LLM summarization step even when an API key is configured
    #[arg(long)]
    pub no_summaries: bool,

    /// Skip hotbar cache generation
    #[arg(long)]
    pub no_hotbar: bool,

    /// API key for the OpenAI-compatible endpoint; summarization is skipped
    /// when absent
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(
        long,
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub api_base_url: String,

    /// Model name, overriding the config's `summaries.model`
    #[arg(long, env = "NEWS_MODEL")]
    pub model: Option<String>,
}
