//! Run configuration.
//!
//! One immutable [`CrawlConfig`] value is constructed at startup — from
//! built-in defaults, optionally overridden by a YAML file — and passed
//! by reference to every component. No component mutates it.
//!
//! The retry and stall policies are represented as data
//! ([`RetryPolicy`], [`StallPolicy`]) rather than separate code paths,
//! so alternative failure-handling behaviors are a configuration choice.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Error produced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// How the URL collector decides a subcategory's listing has gone stale.
///
/// Both policies encode the same intent: stop paying page-fetch cost on
/// listings that have stopped producing new article URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Stall after `max_stall_pages` consecutive pages yield no new URL.
    Pages,
    /// Stall once `stall_timeout_ms` elapses since the last new URL.
    Timer,
}

/// Retry behavior of the HTTP fetcher, expressed as data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    /// Initial backoff delay; doubles with each failed attempt.
    pub base_delay_ms: u64,
    /// Cap on the backoff delay.
    pub max_delay_ms: u64,
    /// HTTP statuses that are worth retrying.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            retry_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// All knobs of a harvest run.
///
/// Every field has a default matching the production site, so an empty
/// config file (or none at all) yields a working configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// Root of the target site.
    pub base_url: String,
    /// Articles published before this year are rejected.
    pub min_year: i32,
    /// Lower word-count bound, exclusive.
    pub min_words: usize,
    /// Upper word-count bound, exclusive.
    pub max_words: usize,
    /// URL collection target per subcategory.
    pub target_per_subcategory: usize,
    /// Listing entries sampled per subcategory during validation.
    pub validation_count: usize,
    /// Accepted samples required to validate a subcategory.
    pub validation_threshold: usize,
    /// Width of the concurrent fetch pool in the crawl stage.
    pub max_workers: usize,
    /// Per-fetch timeout for listing pages.
    pub page_timeout_ms: u64,
    /// Per-fetch timeout for article pages.
    pub article_timeout_ms: u64,
    /// Outer timeout around one crawl unit (fetch + extract).
    pub task_timeout_ms: u64,
    /// Stall detection mode for URL collection.
    pub stall_policy: StallPolicy,
    /// Consecutive no-progress pages tolerated under `StallPolicy::Pages`.
    pub max_stall_pages: u32,
    /// Quiet period tolerated under `StallPolicy::Timer`.
    pub stall_timeout_ms: u64,
    /// Consecutive stalled subcategories before the rest of a category
    /// is skipped.
    pub max_subcategory_failures: u32,
    /// Consecutive failed crawl tasks before the crawl stage stops.
    pub max_consecutive_failures: u32,
    /// Minimum randomized pre-request delay.
    pub jitter_min_ms: u64,
    /// Maximum randomized pre-request delay.
    pub jitter_max_ms: u64,
    /// Transport retry policy.
    pub retry: RetryPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vnexpress.net".to_string(),
            min_year: 2020,
            min_words: 200,
            max_words: 1000,
            target_per_subcategory: 30,
            validation_count: 5,
            validation_threshold: 1,
            max_workers: 6,
            page_timeout_ms: 10_000,
            article_timeout_ms: 5_000,
            task_timeout_ms: 20_000,
            stall_policy: StallPolicy::Pages,
            max_stall_pages: 3,
            stall_timeout_ms: 90_000,
            max_subcategory_failures: 3,
            max_consecutive_failures: 10,
            jitter_min_ms: 500,
            jitter_max_ms: 1500,
            retry: RetryPolicy::default(),
        }
    }
}

impl CrawlConfig {
    /// Load the run configuration, overlaying the YAML file at `path`
    /// (when given) on the defaults.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn article_timeout(&self) -> Duration {
        Duration::from_millis(self.article_timeout_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}
