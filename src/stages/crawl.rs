//! Stage 3: concurrent article-detail extraction.
//!
//! Candidates that survived the known-URL filter are fanned out over a
//! bounded pool (`buffer_unordered`); completions are consumed in
//! arrival order by a single collector loop, which is the only writer
//! of the shared output state. Each unit of work carries its own outer
//! timeout, and a global consecutive-failure counter trips a circuit
//! breaker that cancels all outstanding work. Deterministic corpus
//! ordering is not a goal here; the sorter pass restores it after
//! persistence.

use crate::config::CrawlConfig;
use crate::extract::extract_article;
use crate::fetch::{FetchError, FetchPage};
use crate::models::{ArticleRecord, CandidateUrl};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Per-class tallies of crawl task completions.
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub attempted: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Everything the crawl stage produced, including partial results after
/// a breaker trip or interrupt.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub records: Vec<ArticleRecord>,
    /// URLs that produced an accepted record, for merging into the
    /// caller's known-URL set even when the stage was cut short.
    pub crawled_urls: Vec<String>,
    pub counters: CrawlCounters,
    pub breaker_tripped: bool,
}

enum TaskResult {
    Accepted(ArticleRecord),
    Rejected,
    Failed(FetchError),
    TimedOut,
}

/// Crawl every candidate not already present in `known_urls`.
pub async fn run<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    candidates: Vec<CandidateUrl>,
    known_urls: &HashSet<String>,
) -> CrawlOutcome {
    let total = candidates.len();
    let fresh: Vec<CandidateUrl> = candidates
        .into_iter()
        .filter(|candidate| !known_urls.contains(&candidate.url))
        .collect();
    info!(
        total,
        new = fresh.len(),
        known = total - fresh.len(),
        "crawling article details"
    );

    let mut outcome = CrawlOutcome::default();
    if fresh.is_empty() {
        return outcome;
    }

    let task_timeout = config.task_timeout();
    let mut results = stream::iter(fresh)
        .map(|candidate| async move {
            let result =
                match tokio::time::timeout(task_timeout, scrape_article(fetcher, config, &candidate))
                    .await
                {
                    Ok(Ok(Some(record))) => TaskResult::Accepted(record),
                    Ok(Ok(None)) => TaskResult::Rejected,
                    Ok(Err(e)) => TaskResult::Failed(e),
                    Err(_) => TaskResult::TimedOut,
                };
            (candidate, result)
        })
        .buffer_unordered(config.max_workers.max(1));

    let mut consecutive_failures = 0u32;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut interrupt => {
                warn!("interrupted; returning partial crawl results");
                break;
            }
            next = results.next() => next,
        };
        let Some((candidate, result)) = next else {
            break;
        };

        outcome.counters.attempted += 1;
        match result {
            TaskResult::Accepted(record) => {
                consecutive_failures = 0;
                outcome.counters.succeeded += 1;
                outcome.crawled_urls.push(record.url.clone());
                outcome.records.push(record);
            }
            TaskResult::Rejected => {
                // Content rejection is not a site failure; it neither
                // feeds nor resets the breaker.
                outcome.counters.rejected += 1;
                debug!(url = %candidate.url, "article rejected by filters");
            }
            TaskResult::Failed(e) => {
                consecutive_failures += 1;
                outcome.counters.failed += 1;
                debug!(url = %candidate.url, error = %e, "article fetch failed");
            }
            TaskResult::TimedOut => {
                consecutive_failures += 1;
                outcome.counters.timed_out += 1;
                debug!(url = %candidate.url, ?task_timeout, "task exceeded timeout");
            }
        }

        if consecutive_failures >= config.max_consecutive_failures {
            warn!(
                consecutive_failures,
                "consecutive-failure breaker tripped; cancelling outstanding work"
            );
            outcome.breaker_tripped = true;
            break;
        }
    }
    // Dropping `results` here cancels any in-flight fetches.

    info!(
        attempted = outcome.counters.attempted,
        succeeded = outcome.counters.succeeded,
        rejected = outcome.counters.rejected,
        failed = outcome.counters.failed,
        timed_out = outcome.counters.timed_out,
        breaker_tripped = outcome.breaker_tripped,
        "crawl stage finished"
    );
    outcome
}

/// One unit of crawl work: fetch the article page, then extract.
async fn scrape_article<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    candidate: &CandidateUrl,
) -> Result<Option<ArticleRecord>, FetchError> {
    let html = fetcher.fetch(&candidate.url, config.article_timeout()).await?;
    Ok(extract_article(
        &html,
        &candidate.url,
        &candidate.category,
        &candidate.subcategory,
        config,
    ))
}
