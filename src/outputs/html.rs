//! Static digest page rendering.
//!
//! Plain string formatting, no template engine. The page structure follows
//! the original hand-rolled layout: a centered header with the horizon
//! subtitle, one card per non-empty section with a linked headline list, and
//! a footer note pointing readers at the publishers. When the summarizer
//! ran, each headline carries its summary paragraph and, where present, the
//! disputed annotation.
//!
//! Every interpolated value is escaped; feeds are untrusted input.

use crate::models::DigestPage;
use crate::utils::escape_html;
use std::error::Error;
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Fixed UI strings for a page language.
struct PageStrings {
    heading: &'static str,
    subtitle_prefix: &'static str,
    note: &'static str,
}

impl PageStrings {
    /// The two editions the site ships; anything unknown renders like
    /// English.
    fn for_language(language: &str) -> Self {
        match language {
            "pl" => PageStrings {
                heading: "Aktualności",
                subtitle_prefix: "Ostatnie ~",
                note: "Automatyczny skrót (RSS). Linki prowadzą do wydawców. \
                       Strona nadpisywana codziennie.",
            },
            _ => PageStrings {
                heading: "News",
                subtitle_prefix: "Last ~",
                note: "Automatic digest (RSS). Links go to original publishers. \
                       Page is overwritten daily.",
            },
        }
    }
}

/// Render the full digest page as an HTML string.
pub fn render_digest(page: &DigestPage) -> String {
    let strings = PageStrings::for_language(&page.language);
    let mut out = String::with_capacity(8 * 1024);

    write!(
        out,
        r#"<!doctype html>
<html lang="{lang}">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>{heading} — {site}</title>
  <link rel="icon" href="/assets/favicon.svg" />
  <link rel="stylesheet" href="/assets/site.css" />
  <style>
    header{{ text-align:center; padding:24px 12px 6px }}
    .sub{{ color:#b9c5d8 }}
    main{{ max-width:980px; margin:0 auto; padding:0 16px 48px }}
    .card{{ background:linear-gradient(180deg,rgba(255,255,255,.06),rgba(255,255,255,.02));
           border:1px solid rgba(255,255,255,.08); border-radius:16px; padding:18px 20px; margin:14px 0;
           box-shadow:inset 0 1px 0 rgba(255,255,255,.04), 0 10px 30px rgba(0,0,0,.25) }}
    h2{{ margin:8px 0 6px; color:#d7e6ff }}
    ul.news{{ margin:6px 0 0 18px }}
    .summary{{ margin:2px 0 8px; color:#c3d0e4; font-size:.95rem }}
    .disputed{{ color:#e8c27a; font-size:.88rem }}
    .note{{ color:#9fb3c8; font-size:.92rem }}
  </style>
</head>
<body>
<header>
  <h1>{heading}</h1>
  <p class="sub">{sub_prefix}{hours} h • {date}</p>
</header>
<main>
"#,
        lang = escape_html(&page.language),
        heading = strings.heading,
        site = escape_html(&page.site_name),
        sub_prefix = strings.subtitle_prefix,
        hours = page.horizon_hours,
        date = escape_html(&page.local_date),
    )
    .unwrap();

    for section in &page.sections {
        if section.items.is_empty() {
            continue;
        }
        write!(
            out,
            r#"<section class="card" id="{slug}"><h2>{name}</h2><ul class="news">
"#,
            slug = escape_html(&section.slug),
            name = escape_html(&section.name),
        )
        .unwrap();

        for item in &section.items {
            write!(
                out,
                r#"<li><a href="{link}" target="_blank" rel="noopener">{title}</a>"#,
                link = escape_html(&item.link),
                title = escape_html(&item.title),
            )
            .unwrap();
            if let Some(summary) = &item.summary {
                write!(
                    out,
                    r#"<p class="summary">{text}"#,
                    text = escape_html(&summary.text)
                )
                .unwrap();
                if let Some(disputed) = &summary.disputed {
                    write!(
                        out,
                        r#" <span class="disputed">({note})</span>"#,
                        note = escape_html(disputed)
                    )
                    .unwrap();
                }
                out.push_str("</p>");
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul></section>\n");
    }

    write!(
        out,
        r#"<p class="note">{note}</p>
</main>
<footer style="text-align:center; opacity:.55; padding:18px">© {site}</footer>
</body></html>
"#,
        note = strings.note,
        site = escape_html(&page.site_name),
    )
    .unwrap();

    out
}

/// Render and write the digest page, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(page: &DigestPage, path: &Path) -> Result<(), Box<dyn Error>> {
    let html = render_digest(page);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, html).await?;
    info!("Wrote digest page");
    Ok(())
}
