//! LLM summarization with exponential backoff retry logic.
//!
//! Selected items are sent, title and snippet, to an OpenAI-compatible chat
//! completions endpoint. The model is asked for strict JSON carrying a short
//! summary and an optional "disputed" note for contested stories.
//!
//! # Architecture
//!
//! The module uses a trait-based design:
//! - [`AskAsync`]: core trait defining async LLM interaction
//! - [`OpenAiChat`]: `reqwest` client for the chat completions endpoint
//! - [`RetryAsk`]: decorator that adds retry logic to any `AskAsync`
//!   implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! A summary that still fails after retries falls back to the truncated raw
//! snippet; summarization never drops an item from the digest.

use crate::cache::SummaryCache;
use crate::models::{ItemSummary, NewsItem};
use crate::utils::{truncate_chars, truncate_for_log};
use futures::stream::{self, StreamExt};
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Summaries requested in flight at once.
const CONCURRENT_REQUESTS: usize = 4;

/// Trait for async LLM interaction.
///
/// Implementors can send text to an LLM and receive a response. The
/// abstraction keeps the retry decorator independent of the HTTP client.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a news desk editor. Given a headline and snippet, reply with \
strict JSON only, no markdown fences: {\"summary\": \"one or two plain sentences\", \
\"disputed\": \"short note when facts are contested or unconfirmed, else null\"}. \
Write the summary in the language of the headline.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// The shape the model is asked to produce.
#[derive(Deserialize)]
struct SummaryPayload {
    summary: String,
    #[serde(default)]
    disputed: Option<String>,
}

/// `reqwest` client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiChat {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChat {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                elapsed_ms = t0.elapsed().as_millis() as u128,
                %status,
                body = %truncate_for_log(&body, 300),
                "API call failed"
            );
            return Err(format!("chat completions returned HTTP {status}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "chat completions response had no choices".into())
    }
}

/// Parse the model output into an [`ItemSummary`].
///
/// Tolerates a fenced code block around the JSON, which some models emit
/// despite instructions.
pub fn parse_summary(raw: &str) -> Result<ItemSummary, Box<dyn Error>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let payload: SummaryPayload = serde_json::from_str(body)?;
    Ok(ItemSummary {
        text: payload.summary,
        disputed: payload.disputed.filter(|d| !d.trim().is_empty()),
    })
}

/// Build the user message for one item.
fn build_prompt(item: &NewsItem, max_snippet_chars: usize) -> String {
    if item.snippet.is_empty() {
        format!("Headline: {}", item.title)
    } else {
        format!(
            "Headline: {}\nSnippet: {}",
            item.title,
            truncate_chars(&item.snippet, max_snippet_chars)
        )
    }
}

/// The fallback when the API fails or returns malformed JSON: the truncated
/// raw snippet (or the headline itself when there is none).
fn fallback_summary(item: &NewsItem, max_snippet_chars: usize) -> ItemSummary {
    let source = if item.snippet.is_empty() {
        &item.title
    } else {
        &item.snippet
    };
    ItemSummary {
        text: truncate_chars(source, max_snippet_chars),
        disputed: None,
    }
}

/// Summarize every selected item in place, consulting and extending the
/// cache.
///
/// Cache hits skip the API entirely. Fresh summaries are cached; fallbacks
/// are not, so a later run retries them.
#[instrument(level = "info", skip_all, fields(items = items.len()))]
pub async fn summarize_items(
    chat: &OpenAiChat,
    cache: &mut SummaryCache,
    items: &mut [NewsItem],
    run_date: &str,
    max_snippet_chars: usize,
) {
    let mut misses: Vec<usize> = Vec::new();
    for (idx, item) in items.iter_mut().enumerate() {
        if let Some(cached) = cache.get(&item.title, run_date) {
            item.summary = Some(cached.clone());
        } else {
            misses.push(idx);
        }
    }
    let hits = items.len() - misses.len();
    info!(hits, misses = misses.len(), "Summary cache consulted");

    let api = RetryAsk::new(chat, 5, StdDuration::from_secs(1));
    let api = &api;

    let results: Vec<(usize, Result<ItemSummary, Box<dyn Error>>)> =
        stream::iter(misses.into_iter().map(|idx| {
            let prompt = build_prompt(&items[idx], max_snippet_chars);
            async move {
                let result = match api.ask(&prompt).await {
                    Ok(raw) => parse_summary(&raw).map_err(|e| {
                        warn!(
                            error = %e,
                            response_preview = %truncate_for_log(&raw, 300),
                            "Model returned non-conforming JSON"
                        );
                        e
                    }),
                    Err(e) => Err(e),
                };
                (idx, result)
            }
        }))
        .buffer_unordered(CONCURRENT_REQUESTS)
        .collect()
        .await;

    let mut fresh = 0usize;
    let mut fallbacks = 0usize;
    for (idx, result) in results {
        let item = &mut items[idx];
        match result {
            Ok(summary) => {
                cache.insert(&item.title, run_date, summary.clone());
                item.summary = Some(summary);
                fresh += 1;
            }
            Err(e) => {
                warn!(title = %item.title, error = %e, "Summarization failed; using snippet fallback");
                item.summary = Some(fallback_summary(item, max_snippet_chars));
                fallbacks += 1;
            }
        }
    }
    info!(fresh, fallbacks, "Summarization pass complete");
}

// Reference-through impl so RetryAsk can wrap a borrowed client.
impl<T> AskAsync for &T
where
    T: AskAsync,
{
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        (**self).ask(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, snippet: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: "https://example.com/x".to_string(),
            published: None,
            snippet: snippet.to_string(),
            host: "example.com".to_string(),
            score: 0.0,
            summary: None,
        }
    }

    #[test]
    fn test_parse_summary_plain_json() {
        let summary =
            parse_summary(r#"{"summary": "Markets fell.", "disputed": null}"#).unwrap();
        assert_eq!(summary.text, "Markets fell.");
        assert!(summary.disputed.is_none());
    }

    #[test]
    fn test_parse_summary_with_disputed_note() {
        let summary = parse_summary(
            r#"{"summary": "Strike reported.", "disputed": "casualty figures unconfirmed"}"#,
        )
        .unwrap();
        assert_eq!(
            summary.disputed.as_deref(),
            Some("casualty figures unconfirmed")
        );
    }

    #[test]
    fn test_parse_summary_strips_fences() {
        let raw = "```json\n{\"summary\": \"Vote passed.\", \"disputed\": null}\n```";
        let summary = parse_summary(raw).unwrap();
        assert_eq!(summary.text, "Vote passed.");
    }

    #[test]
    fn test_parse_summary_blank_disputed_dropped() {
        let summary =
            parse_summary(r#"{"summary": "Quiet day.", "disputed": "  "}"#).unwrap();
        assert!(summary.disputed.is_none());
    }

    #[test]
    fn test_parse_summary_rejects_garbage() {
        assert!(parse_summary("Sure! Here is your summary: markets fell.").is_err());
    }

    #[test]
    fn test_build_prompt_without_snippet() {
        let prompt = build_prompt(&item("Storm hits coast", ""), 400);
        assert_eq!(prompt, "Headline: Storm hits coast");
    }

    #[test]
    fn test_build_prompt_truncates_snippet() {
        let long = "word ".repeat(200);
        let prompt = build_prompt(&item("Storm hits coast", &long), 50);
        assert!(prompt.len() < 120);
        assert!(prompt.contains("…"));
    }

    #[test]
    fn test_fallback_prefers_snippet() {
        let fallback = fallback_summary(&item("Title only", "A snippet of text."), 400);
        assert_eq!(fallback.text, "A snippet of text.");
        let fallback = fallback_summary(&item("Title only", ""), 400);
        assert_eq!(fallback.text, "Title only");
    }

    struct FlakyAsk {
        failures: std::sync::atomic::AtomicUsize,
    }

    impl AskAsync for FlakyAsk {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            use std::sync::atomic::Ordering;
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                Err("transient".into())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let flaky = FlakyAsk {
            failures: std::sync::atomic::AtomicUsize::new(2),
        };
        let api = RetryAsk::new(flaky, 5, StdDuration::from_millis(1));
        assert_eq!(api.ask("x").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max() {
        let flaky = FlakyAsk {
            failures: std::sync::atomic::AtomicUsize::new(100),
        };
        let api = RetryAsk::new(flaky, 2, StdDuration::from_millis(1));
        assert!(api.ask("x").await.is_err());
    }
}
