//! HTTP client construction and feed downloads.
//!
//! One `reqwest::Client` is built per run and shared by the digest and
//! hotbar fetchers. Feeds are public endpoints; the only request shaping is
//! a timeout, a stable user agent, and an Accept header naming the feed
//! content types.

use reqwest::header;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = concat!("briefrooms_news/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client.
pub fn build_client() -> Result<reqwest::Client, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::default())
        .build()?;
    Ok(client)
}

/// Download one feed body.
///
/// Non-2xx statuses are errors; the caller decides whether to skip or fail.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn fetch_feed_body(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let response = client
        .get(url)
        .header(
            header::ACCEPT,
            "application/rss+xml, application/atom+xml, application/xml, text/xml, */*;q=0.9",
        )
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("feed returned HTTP {status}").into());
    }

    let bytes = response.bytes().await?;
    debug!(bytes = bytes.len(), "Downloaded feed body");
    Ok(bytes.to_vec())
}
