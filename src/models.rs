//! Data models shared across the harvest pipeline.
//!
//! This module defines the core data structures passed between stages:
//! - [`ArticleRecord`]: the persisted unit, one NDJSON line per record
//! - [`CandidateUrl`]: an ephemeral work item produced by URL collection
//!   and consumed by the detail crawler
//! - [`ValidatedSection`]: a category/subcategory pair that survived
//!   sample validation
//!
//! Records are fixed-field structs rather than open maps so that a
//! missing field is a construction error, not a surprise at export time.

use serde::{Deserialize, Serialize};

/// A fully extracted, accepted news article.
///
/// Instances only exist when every field is present and the article
/// passed the word-count and publication-year filters; extraction never
/// produces a partially populated record.
///
/// Field order matters: the CSV projection writes columns in the order
/// they are declared here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Top-level section of the site, e.g. `thoi-su`.
    pub category: String,
    /// Leaf listing section under the category, e.g. `chinh-tri`.
    pub sub_category: String,
    /// Canonical article URL; globally unique within the corpus.
    pub url: String,
    /// Article headline.
    pub title: String,
    /// Lead paragraph / standfirst.
    pub description: String,
    /// Body text, paragraphs joined with single spaces.
    pub content: String,
    /// Publication timestamp formatted `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    /// Whitespace-delimited token count of `content`.
    pub words: usize,
}

/// An article URL discovered on a listing page, waiting to be crawled.
///
/// Candidates are never persisted; they live only for the duration of a
/// run. The category and subcategory are always attached at discovery
/// time so the detail crawler needs no out-of-band defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub category: String,
    pub subcategory: String,
}

/// A category/subcategory pair accepted by the validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSection {
    pub category: String,
    pub subcategory: String,
}
