//! Stage 2: bounded URL discovery over paginated listings.
//!
//! Each validated subcategory is paginated with a monotonic page cursor
//! until the collection target is reached, the listing runs out, or a
//! stall policy decides the listing has gone stale. Stalled
//! subcategories count against a per-category breaker: a systemic block
//! (IP throttling, section removal) aborts the whole category quickly
//! instead of grinding every subcategory to exhaustion.

use crate::config::{CrawlConfig, StallPolicy};
use crate::extract::listing_urls;
use crate::fetch::FetchPage;
use crate::models::{CandidateUrl, ValidatedSection};
use itertools::Itertools;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// How a single subcategory's collection ended. Every variant carries
/// whatever was gathered before the loop stopped.
#[derive(Debug)]
pub enum CollectOutcome {
    /// The collection target was reached.
    Complete(Vec<CandidateUrl>),
    /// The listing ran out: a page failed to fetch or had no entries.
    Exhausted(Vec<CandidateUrl>),
    /// The stall policy fired; counts against the category breaker.
    Stalled(Vec<CandidateUrl>),
}

/// Collect candidate URLs for every validated subcategory, applying the
/// per-category consecutive-stall breaker.
pub async fn run<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    sections: &[ValidatedSection],
) -> Vec<CandidateUrl> {
    let base = match Url::parse(&config.base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!(base_url = %config.base_url, error = %e, "invalid base url; nothing to collect");
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let grouped = sections.iter().chunk_by(|section| section.category.clone());
    'categories: for (category, group) in &grouped {
        let mut consecutive_stalls = 0u32;

        for section in group {
            if consecutive_stalls >= config.max_subcategory_failures {
                warn!(
                    %category,
                    consecutive_stalls,
                    "too many stalled subcategories; skipping the rest of the category"
                );
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = &mut interrupt => {
                    warn!("interrupted; stopping URL collection");
                    break 'categories;
                }
                outcome = collect_subcategory(
                    fetcher,
                    config,
                    &base,
                    &category,
                    &section.subcategory,
                ) => outcome,
            };

            match outcome {
                CollectOutcome::Complete(urls) => {
                    consecutive_stalls = 0;
                    candidates.extend(urls);
                }
                CollectOutcome::Exhausted(urls) => {
                    consecutive_stalls = 0;
                    debug!(
                        %category,
                        subcategory = %section.subcategory,
                        collected = urls.len(),
                        "pagination exhausted before target"
                    );
                    candidates.extend(urls);
                }
                CollectOutcome::Stalled(urls) => {
                    consecutive_stalls += 1;
                    warn!(
                        %category,
                        subcategory = %section.subcategory,
                        collected = urls.len(),
                        "subcategory stalled"
                    );
                    candidates.extend(urls);
                }
            }
        }
    }

    info!(candidates = candidates.len(), "URL collection complete");
    candidates
}

/// Paginate one subcategory's listing until a terminal condition.
///
/// The page cursor increments every iteration regardless of outcome.
/// URLs are deduplicated within the subcategory, so a page repeating
/// already-seen links makes no progress and feeds the stall policy.
pub async fn collect_subcategory<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    base: &Url,
    category: &str,
    subcategory: &str,
) -> CollectOutcome {
    let target = config.target_per_subcategory;
    let root = config.base_url.trim_end_matches('/');
    let mut urls: Vec<CandidateUrl> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut page_num = 1u32;
    let mut stale_pages = 0u32;
    let mut last_progress = Instant::now();

    loop {
        if urls.len() >= target {
            info!(category, subcategory, collected = urls.len(), "collection target reached");
            return CollectOutcome::Complete(urls);
        }

        let stalled = match config.stall_policy {
            StallPolicy::Pages => stale_pages >= config.max_stall_pages,
            StallPolicy::Timer => last_progress.elapsed() >= config.stall_timeout(),
        };
        if stalled {
            return CollectOutcome::Stalled(urls);
        }

        let page_url = format!("{root}/{category}/{subcategory}-p{page_num}");
        let html = match fetcher.fetch(&page_url, config.page_timeout()).await {
            Ok(html) => html,
            Err(e) => {
                debug!(%page_url, error = %e, "listing page unreachable; stopping pagination");
                return CollectOutcome::Exhausted(urls);
            }
        };

        let links = listing_urls(&html, base);
        if links.is_empty() {
            debug!(%page_url, "listing page has no entries");
            return CollectOutcome::Exhausted(urls);
        }

        let mut found_new = false;
        for link in links {
            if urls.len() >= target {
                break;
            }
            if seen.insert(link.clone()) {
                urls.push(CandidateUrl {
                    url: link,
                    category: category.to_string(),
                    subcategory: subcategory.to_string(),
                });
                found_new = true;
            }
        }

        if found_new {
            stale_pages = 0;
            last_progress = Instant::now();
        } else {
            stale_pages += 1;
        }
        page_num += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedFetcher;

    fn test_config(target: usize, max_stall_pages: u32) -> CrawlConfig {
        CrawlConfig {
            target_per_subcategory: target,
            max_stall_pages,
            max_subcategory_failures: 2,
            ..CrawlConfig::default()
        }
    }

    fn listing_html(links: &[&str]) -> String {
        links
            .iter()
            .map(|link| format!(r#"<h3 class="title-news"><a href="{link}">t</a></h3>"#))
            .collect()
    }

    fn base() -> Url {
        Url::parse("https://vnexpress.net").unwrap()
    }

    fn page_url(subcategory: &str, page: u32) -> String {
        format!("https://vnexpress.net/thoi-su/{subcategory}-p{page}")
    }

    #[tokio::test]
    async fn stops_after_consecutive_stale_pages_keeping_partial_urls() {
        // Pages 1-2 produce new links; pages 3-5 repeat old ones.
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url("chinh-tri", 1), &listing_html(&["/a-1.html", "/a-2.html"]))
            .with_page(&page_url("chinh-tri", 2), &listing_html(&["/a-3.html", "/a-4.html"]))
            .with_page(&page_url("chinh-tri", 3), &listing_html(&["/a-1.html"]))
            .with_page(&page_url("chinh-tri", 4), &listing_html(&["/a-2.html"]))
            .with_page(&page_url("chinh-tri", 5), &listing_html(&["/a-3.html"]));

        let outcome = collect_subcategory(
            &fetcher,
            &test_config(50, 3),
            &base(),
            "thoi-su",
            "chinh-tri",
        )
        .await;

        match outcome {
            CollectOutcome::Stalled(urls) => {
                assert_eq!(urls.len(), 4);
                assert_eq!(urls[0].url, "https://vnexpress.net/a-1.html");
                assert_eq!(urls[0].category, "thoi-su");
                assert_eq!(urls[0].subcategory, "chinh-tri");
            }
            other => panic!("expected stall, got {other:?}"),
        }
        assert_eq!(fetcher.calls(), 5);
    }

    #[tokio::test]
    async fn empty_listing_page_exhausts_pagination() {
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url("chinh-tri", 1), &listing_html(&["/a-1.html"]))
            .with_page(&page_url("chinh-tri", 2), "<html><body></body></html>");

        let outcome = collect_subcategory(
            &fetcher,
            &test_config(50, 3),
            &base(),
            "thoi-su",
            "chinh-tri",
        )
        .await;

        match outcome {
            CollectOutcome::Exhausted(urls) => assert_eq!(urls.len(), 1),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_exhausts_pagination() {
        let fetcher = ScriptedFetcher::new()
            .with_page(&page_url("chinh-tri", 1), &listing_html(&["/a-1.html"]));
        // page 2 is unscripted and answers 404

        let outcome = collect_subcategory(
            &fetcher,
            &test_config(50, 3),
            &base(),
            "thoi-su",
            "chinh-tri",
        )
        .await;

        assert!(matches!(outcome, CollectOutcome::Exhausted(urls) if urls.len() == 1));
    }

    #[tokio::test]
    async fn target_truncates_within_a_page() {
        let fetcher = ScriptedFetcher::new().with_page(
            &page_url("chinh-tri", 1),
            &listing_html(&["/a-1.html", "/a-2.html", "/a-3.html"]),
        );

        let outcome = collect_subcategory(
            &fetcher,
            &test_config(2, 3),
            &base(),
            "thoi-su",
            "chinh-tri",
        )
        .await;

        match outcome {
            CollectOutcome::Complete(urls) => assert_eq!(urls.len(), 2),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn timer_policy_stalls_after_a_quiet_period() {
        // A zero-length quiet period stalls before the first fetch.
        let fetcher = ScriptedFetcher::new();
        let config = CrawlConfig {
            stall_policy: StallPolicy::Timer,
            stall_timeout_ms: 0,
            ..test_config(50, 3)
        };

        let outcome =
            collect_subcategory(&fetcher, &config, &base(), "thoi-su", "chinh-tri").await;

        assert!(matches!(outcome, CollectOutcome::Stalled(urls) if urls.is_empty()));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn consecutive_stalls_skip_the_rest_of_the_category() {
        // Subcategories one and two stall (every page repeats one link);
        // with the breaker at 2, three and four are never touched.
        let mut fetcher = ScriptedFetcher::new();
        for sub in ["mot", "hai"] {
            let link = format!("/{sub}-1.html");
            for page in 1..=3u32 {
                fetcher = fetcher.with_page(&page_url(sub, page), &listing_html(&[&link]));
            }
        }

        let sections: Vec<ValidatedSection> = ["mot", "hai", "ba", "bon"]
            .iter()
            .map(|sub| ValidatedSection {
                category: "thoi-su".to_string(),
                subcategory: sub.to_string(),
            })
            .collect();

        let candidates = run(&fetcher, &test_config(50, 2), &sections).await;

        // one partial URL per stalled subcategory, none from the skipped ones
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.subcategory == "mot" || c.subcategory == "hai"));
        // three pages each for the two stalled subcategories
        assert_eq!(fetcher.calls(), 6);
    }
}
