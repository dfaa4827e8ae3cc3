//! # VnExpress Harvest
//!
//! A staged pipeline that harvests structured article records from
//! VnExpress listing pages and maintains a deduplicated, canonically
//! ordered NDJSON corpus across runs.
//!
//! ## Pipeline
//!
//! 1. **Validation**: sample each catalog subcategory and drop the ones
//!    whose articles systematically fail the content filters
//! 2. **URL collection**: paginate the surviving subcategories under a
//!    stall budget, escalating repeated stalls to category-level skips
//! 3. **Detail crawl**: fetch and extract articles over a bounded
//!    concurrent pool with per-task timeouts and a consecutive-failure
//!    circuit breaker
//! 4. **Persistence**: append the new records, then normalize the whole
//!    corpus (dedup + stable sort) with an atomic rewrite, plus an
//!    optional CSV projection
//!
//! Every stage degrades instead of aborting: unreachable sections,
//! rejected articles, corrupt corpus lines, and mid-run interrupts all
//! shrink the output rather than crash the run.
//!
//! ## Usage
//!
//! ```sh
//! vnexpress_harvest --catalog catalog.json --csv corpus/vnexpress_articles.csv
//! ```

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod catalog;
mod cli;
mod config;
mod dates;
mod extract;
mod fetch;
mod models;
mod outputs;
mod sort;
mod stages;
mod utils;

use catalog::Catalog;
use cli::Cli;
use config::CrawlConfig;
use fetch::{HttpFetcher, RetryFetch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("vnexpress_harvest starting up");

    let args = Cli::parse();
    let config = CrawlConfig::load(args.config.as_deref())?;
    info!(base_url = %config.base_url, workers = config.max_workers, "configuration loaded");

    // A broken catalog degrades the run (no crawl, no reorder) but does
    // not abort it.
    let catalog = match Catalog::load(&args.catalog) {
        Ok(catalog) => {
            info!(path = %args.catalog, pairs = catalog.pair_count(), "category catalog loaded");
            Some(catalog)
        }
        Err(e) => {
            error!(path = %args.catalog, error = %e, "failed to load category catalog");
            None
        }
    };

    let corpus_path = PathBuf::from(&args.corpus);
    if let Some(parent) = corpus_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        utils::ensure_writable_dir(parent).await?;
    }

    let mut known_urls = outputs::jsonl::load_known_urls(&corpus_path).await;
    info!(known = known_urls.len(), "loaded previously crawled urls");

    if args.normalize_only {
        info!("normalize-only run; skipping crawl stages");
    } else if let Some(catalog) = &catalog {
        let fetcher = RetryFetch::new(HttpFetcher::new(&config)?, config.retry.clone());

        let sections = stages::validate::run(&fetcher, &config, catalog).await;
        let candidates = stages::collect::run(&fetcher, &config, &sections).await;
        let outcome = stages::crawl::run(&fetcher, &config, candidates, &known_urls).await;

        known_urls.extend(outcome.crawled_urls.iter().cloned());
        if outcome.records.is_empty() {
            warn!("crawl produced no new records");
        } else {
            outputs::jsonl::append_records(&outcome.records, &corpus_path).await?;
        }
    } else {
        warn!("no catalog available; skipping crawl stages");
    }

    // --- Normalize the corpus: dedup + canonical order ---
    let corpus = outputs::jsonl::load_corpus(&corpus_path).await;
    let normalized = sort::sort_and_deduplicate(corpus, catalog.as_ref());
    if !normalized.is_empty() {
        outputs::jsonl::export_ordered(&normalized, &corpus_path).await?;
        if let Some(csv_path) = &args.csv {
            outputs::table::write_table(&normalized, Path::new(csv_path))?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total_records = normalized.len(),
        known_urls = known_urls.len(),
        "run complete"
    );

    // Exit status reflects whether any data exists, not whether every
    // candidate succeeded.
    if normalized.is_empty() {
        return Err("run finished with an empty corpus".into());
    }
    Ok(())
}
