//! Output generation for the digest page and the hotbar cache.
//!
//! # Submodules
//!
//! - [`html`]: renders the static digest page by string formatting
//! - [`hotbar`]: builds and writes the ticker JSON cache
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── en/news.html                  # digest page (path from config)
//! ├── cache/hotbar.json             # ticker entries
//! └── .cache/news_summaries.json    # summary memoization
//! ```

pub mod hotbar;
pub mod html;
