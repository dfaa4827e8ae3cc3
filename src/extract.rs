//! HTML extraction for listing and article pages.
//!
//! Article pages are mined for four structural markers:
//!
//! | Field       | Selector          |
//! |-------------|-------------------|
//! | title       | `h1.title-detail` |
//! | description | `p.description`   |
//! | date        | `span.date`       |
//! | body        | `p.Normal`        |
//!
//! Extraction is all-or-nothing: a missing marker, an unparseable or
//! too-old date, or a word count outside the configured window yields
//! `None`. No partial record is ever produced; rejections surface only
//! in stage-level counters.

use crate::config::CrawlConfig;
use crate::dates::parse_vietnamese_date;
use crate::models::ArticleRecord;
use chrono::Datelike;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;
use url::Url;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1.title-detail").unwrap());
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.description").unwrap());
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span.date").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p.Normal").unwrap());
static LISTING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".title-news a[href]").unwrap());

/// Single-space-normalized text of an element.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract candidate article URLs from a listing page.
///
/// Relative hrefs are resolved against `base`; unresolvable ones are
/// dropped.
pub fn listing_urls(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&LISTING_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|resolved| resolved.to_string())
        .collect()
}

/// Extract a complete [`ArticleRecord`] from an article page, or reject it.
pub fn extract_article(
    html: &str,
    url: &str,
    category: &str,
    subcategory: &str,
    config: &CrawlConfig,
) -> Option<ArticleRecord> {
    let document = Html::parse_document(html);

    let title = document.select(&TITLE_SELECTOR).next().map(element_text)?;
    let description = document
        .select(&DESCRIPTION_SELECTOR)
        .next()
        .map(element_text)?;
    if title.is_empty() || description.is_empty() {
        trace!(%url, "rejected: empty title or description");
        return None;
    }

    let raw_date = document.select(&DATE_SELECTOR).next().map(element_text)?;
    let date = parse_vietnamese_date(&raw_date)?;
    if date.year() < config.min_year {
        trace!(%url, year = date.year(), "rejected: published before minimum year");
        return None;
    }

    let content = document
        .select(&BODY_SELECTOR)
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" ");
    let words = content.split_whitespace().count();
    if words <= config.min_words || words >= config.max_words {
        trace!(%url, words, "rejected: word count outside window");
        return None;
    }

    Some(ArticleRecord {
        category: category.to_string(),
        sub_category: subcategory.to_string(),
        url: url.to_string(),
        title,
        description,
        content,
        date: date.format("%Y-%m-%d %H:%M:%S").to_string(),
        words,
    })
}
