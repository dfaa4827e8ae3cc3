//! Stage 1: subcategory validation by sampling.
//!
//! Before spending the bounded crawl pool on a subcategory, a handful of
//! its listed articles are extracted with the standard filters. A
//! subcategory whose samples all fail (photo galleries, live blogs,
//! video sections) is excluded from the rest of the run. Validation is
//! sequential on purpose: it touches few pages and should not add
//! discovery load on top of the crawl stage.

use crate::catalog::Catalog;
use crate::config::CrawlConfig;
use crate::extract::{extract_article, listing_urls};
use crate::fetch::FetchPage;
use crate::models::ValidatedSection;
use tracing::{debug, info, warn};
use url::Url;

/// Validate every (category, subcategory) pair in the catalog.
///
/// Returns the accepted pairs in catalog order. Interrupting the run
/// returns the pairs accepted so far.
pub async fn run<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    catalog: &Catalog,
) -> Vec<ValidatedSection> {
    let base = match Url::parse(&config.base_url) {
        Ok(base) => base,
        Err(e) => {
            warn!(base_url = %config.base_url, error = %e, "invalid base url; nothing to validate");
            return Vec::new();
        }
    };

    info!(pairs = catalog.pair_count(), "validating subcategories");
    let mut accepted = Vec::new();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    for (category, subcategory) in catalog.pairs() {
        let valid = tokio::select! {
            biased;
            _ = &mut interrupt => {
                warn!("interrupted; stopping validation");
                break;
            }
            valid = validate_section(fetcher, config, &base, category, subcategory) => valid,
        };

        if valid {
            info!(category, subcategory, "subcategory validated");
            accepted.push(ValidatedSection {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            });
        } else {
            debug!(category, subcategory, "subcategory rejected");
        }
    }

    info!(
        accepted = accepted.len(),
        total = catalog.pair_count(),
        "validation complete"
    );
    accepted
}

/// Sample up to `validation_count` articles from the subcategory's first
/// listing page; accept once `validation_threshold` of them extract
/// cleanly.
async fn validate_section<F: FetchPage>(
    fetcher: &F,
    config: &CrawlConfig,
    base: &Url,
    category: &str,
    subcategory: &str,
) -> bool {
    let listing_url = format!(
        "{}/{}/{}-p1",
        config.base_url.trim_end_matches('/'),
        category,
        subcategory
    );
    let html = match fetcher.fetch(&listing_url, config.page_timeout()).await {
        Ok(html) => html,
        Err(e) => {
            debug!(%listing_url, error = %e, "listing unreachable");
            return false;
        }
    };

    let candidates = listing_urls(&html, base);
    if candidates.is_empty() {
        debug!(%listing_url, "listing has no entries");
        return false;
    }

    let threshold = config.validation_threshold.max(1);
    let mut validated = 0usize;
    for url in candidates.iter().take(config.validation_count) {
        match fetcher.fetch(url, config.article_timeout()).await {
            Ok(article_html) => {
                if extract_article(&article_html, url, category, subcategory, config).is_some() {
                    validated += 1;
                    if validated >= threshold {
                        return true;
                    }
                }
            }
            Err(e) => debug!(%url, error = %e, "sample fetch failed"),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedFetcher;

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            min_words: 3,
            max_words: 10,
            validation_count: 3,
            validation_threshold: 1,
            ..CrawlConfig::default()
        }
    }

    fn listing_html(links: &[&str]) -> String {
        links
            .iter()
            .map(|link| format!(r#"<h3 class="title-news"><a href="{link}">t</a></h3>"#))
            .collect()
    }

    fn valid_article_html() -> String {
        r#"<html><body>
            <h1 class="title-detail">Tiêu đề</h1>
            <p class="description">Mô tả.</p>
            <span class="date">Thứ hai, 10/06/2024, 10:30 (GMT+7)</span>
            <p class="Normal">một hai ba bốn năm</p>
        </body></html>"#
            .to_string()
    }

    fn catalog_one_pair() -> Catalog {
        Catalog::from_entries(vec![(
            "thoi-su".to_string(),
            vec!["chinh-tri".to_string()],
        )])
    }

    #[tokio::test]
    async fn first_valid_sample_accepts_and_short_circuits() {
        let fetcher = ScriptedFetcher::new()
            .with_page(
                "https://vnexpress.net/thoi-su/chinh-tri-p1",
                &listing_html(&["/bai-mot-1.html", "/bai-hai-2.html", "/bai-ba-3.html"]),
            )
            .with_page("https://vnexpress.net/bai-mot-1.html", &valid_article_html());

        let accepted = run(&fetcher, &test_config(), &catalog_one_pair()).await;

        assert_eq!(
            accepted,
            vec![ValidatedSection {
                category: "thoi-su".to_string(),
                subcategory: "chinh-tri".to_string(),
            }]
        );
        // one listing fetch + one sample fetch; remaining samples skipped
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn unreachable_listing_rejects_the_pair() {
        let fetcher =
            ScriptedFetcher::new().with_failure("https://vnexpress.net/thoi-su/chinh-tri-p1", 500);

        let accepted = run(&fetcher, &test_config(), &catalog_one_pair()).await;
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn all_samples_failing_rejects_the_pair() {
        // Listing is fine, but every sampled article is an unparseable stub.
        let fetcher = ScriptedFetcher::new()
            .with_page(
                "https://vnexpress.net/thoi-su/chinh-tri-p1",
                &listing_html(&["/bai-mot-1.html", "/bai-hai-2.html"]),
            )
            .with_page("https://vnexpress.net/bai-mot-1.html", "<html></html>")
            .with_page("https://vnexpress.net/bai-hai-2.html", "<html></html>");

        let accepted = run(&fetcher, &test_config(), &catalog_one_pair()).await;
        assert!(accepted.is_empty());
        assert_eq!(fetcher.calls(), 3);
    }
}
