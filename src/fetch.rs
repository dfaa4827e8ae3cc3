//! Rate-limited, retried page fetching.
//!
//! All page retrieval goes through the [`FetchPage`] trait so the crawl
//! stages can be exercised against scripted fetchers in tests. The
//! production implementation is [`HttpFetcher`] wrapped in
//! [`RetryFetch`]:
//!
//! - [`HttpFetcher`] issues a single GET with a randomized pre-request
//!   delay, a User-Agent rotated from a small pool, realistic browser
//!   headers, and a per-call timeout.
//! - [`RetryFetch`] decorates any [`FetchPage`] with retries for
//!   transient failures, backing off exponentially with jitter.
//!
//! Every transport failure is converted into a typed [`FetchError`];
//! nothing below this boundary leaks upward.
//!
//! # Retry Strategy
//!
//! The delay between attempts follows:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::{CrawlConfig, RetryPolicy};
use rand::seq::IndexedRandom;
use rand::{rng, Rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7";

/// A failed page fetch, classified for retry decisions and reporting.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    Status(StatusCode),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether a retry might help: timeouts and connection-level errors
    /// always qualify; HTTP statuses only when the policy lists them.
    pub fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::Transport(_) => true,
            FetchError::Status(status) => policy.retry_statuses.contains(&status.as_u16()),
        }
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(error)
    }
}

/// Capability to fetch the body of a URL within a timeout.
pub trait FetchPage {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Production fetcher over a shared `reqwest` connection pool.
pub struct HttpFetcher {
    client: Client,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let client = Client::builder().build().map_err(FetchError::Transport)?;
        Ok(Self {
            client,
            jitter_min_ms: config.jitter_min_ms,
            jitter_max_ms: config.jitter_max_ms,
        })
    }

    /// Randomized delay before each request, to avoid burst patterns
    /// against the target site.
    async fn pre_request_delay(&self) {
        if self.jitter_max_ms == 0 {
            return;
        }
        let span = self.jitter_min_ms..=self.jitter_max_ms.max(self.jitter_min_ms);
        let delay_ms = rng().random_range(span);
        sleep(Duration::from_millis(delay_ms)).await;
    }
}

impl FetchPage for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self.pre_request_delay().await;

        let agent = *USER_AGENTS.choose(&mut rng()).expect("user agent pool is non-empty");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, agent)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "fetch returned http error");
            return Err(FetchError::Status(status));
        }

        let body = response.text().await.map_err(classify)?;
        debug!(%url, bytes = body.len(), "fetch succeeded");
        Ok(body)
    }
}

/// Decorator that adds retry-with-backoff to any [`FetchPage`].
///
/// Retry behavior is driven entirely by the [`RetryPolicy`] it is
/// constructed with; no retry state persists across calls.
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: FetchPage,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> FetchPage for RetryFetch<T>
where
    T: FetchPage,
{
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.inner.fetch(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt >= self.policy.max_attempts || !e.is_retryable(&self.policy) {
                        warn!(%url, attempt, error = %e, "fetch failed; giving up");
                        return Err(e);
                    }

                    let mut delay = self
                        .policy
                        .base_delay()
                        .saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.policy.max_delay() {
                        delay = self.policy.max_delay();
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        %url,
                        attempt,
                        max = self.policy.max_attempts,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            retry_statuses: vec![500, 502, 503, 504],
        }
    }

    #[test]
    fn retryability_classification() {
        let policy = RetryPolicy::default();
        assert!(FetchError::Timeout.is_retryable(&policy));
        assert!(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE).is_retryable(&policy));
        assert!(!FetchError::Status(StatusCode::NOT_FOUND).is_retryable(&policy));
    }

    #[tokio::test]
    async fn retryable_status_exhausts_the_budget() {
        let inner = ScriptedFetcher::new().with_failure("https://x.test/p", 503);
        let fetcher = RetryFetch::new(inner, fast_policy(3));

        let result = fetcher.fetch("https://x.test/p", Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
        assert_eq!(fetcher.inner.calls(), 3);
    }

    #[tokio::test]
    async fn non_retryable_status_fails_immediately() {
        let inner = ScriptedFetcher::new().with_failure("https://x.test/p", 404);
        let fetcher = RetryFetch::new(inner, fast_policy(3));

        let result = fetcher.fetch("https://x.test/p", Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(FetchError::Status(StatusCode::NOT_FOUND))
        ));
        assert_eq!(fetcher.inner.calls(), 1);
    }

    #[tokio::test]
    async fn recovers_within_the_budget() {
        let inner = ScriptedFetcher::new()
            .with_failure("https://x.test/p", 502)
            .with_failure("https://x.test/p", 502)
            .with_page("https://x.test/p", "<html>ok</html>");
        let fetcher = RetryFetch::new(inner, fast_policy(3));

        let body = fetcher
            .fetch("https://x.test/p", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
        assert_eq!(fetcher.inner.calls(), 3);
    }
}
