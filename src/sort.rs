//! Deduplication and canonical ordering of the corpus.
//!
//! The corpus order is defined by the tuple
//! `(category_rank, subcategory_rank, url_index)`: catalog position for
//! the first two, the trailing numeric article ID from the URL for the
//! third. Unknown categories and subcategories sort last. Duplicates
//! (same URL) keep their first occurrence in input order, and the sort
//! is stable, so equal keys preserve relative input order — the whole
//! pass is a deterministic, idempotent normalization.

use crate::catalog::Catalog;
use crate::models::ArticleRecord;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

static URL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d+)\.html").unwrap());

/// The numeric article ID embedded in a URL like
/// `.../giao-thong/bai-viet-4002912.html`, or 0 when absent.
pub fn url_index(url: &str) -> u64 {
    URL_ID
        .captures(url)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse().ok())
        .unwrap_or(0)
}

fn sort_key(record: &ArticleRecord, catalog: &Catalog) -> (usize, usize, u64) {
    (
        catalog.category_rank(&record.category),
        catalog.subcategory_rank(&record.category, &record.sub_category),
        url_index(&record.url),
    )
}

/// Remove duplicate URLs (keeping first occurrences) and impose the
/// canonical order.
///
/// Without a catalog there is no ordering to impose; the input comes
/// back untouched so a broken catalog file degrades the run instead of
/// crashing it.
pub fn sort_and_deduplicate(
    records: Vec<ArticleRecord>,
    catalog: Option<&Catalog>,
) -> Vec<ArticleRecord> {
    let Some(catalog) = catalog else {
        warn!("category catalog unavailable; leaving corpus order untouched");
        return records;
    };

    let before = records.len();
    let mut unique: Vec<ArticleRecord> = records
        .into_iter()
        .unique_by(|record| record.url.clone())
        .collect();
    let dropped = before - unique.len();
    if dropped > 0 {
        info!(dropped, remaining = unique.len(), "removed duplicate records");
    }

    unique.sort_by_cached_key(|record| sort_key(record, catalog));
    unique
}
