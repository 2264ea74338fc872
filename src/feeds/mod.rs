//! Feed fetching and parsing.
//!
//! This module turns configured RSS/Atom URLs into normalized
//! [`crate::models::NewsItem`]s in two phases:
//!
//! 1. **Fetching**: download the feed body over HTTP ([`client`])
//! 2. **Parsing**: parse RSS/Atom and normalize entries ([`parser`])
//!
//! [`fetcher`] drives both phases concurrently across a section's feeds.
//! A failed feed is logged and skipped; one dead source never fails a run.

pub mod client;
pub mod fetcher;
pub mod parser;
