//! Command-line interface definitions.

use clap::Parser;

/// Command-line arguments for the harvester.
///
/// # Examples
///
/// ```sh
/// # Crawl with defaults, catalog in the working directory
/// vnexpress_harvest
///
/// # Explicit paths plus a CSV projection
/// vnexpress_harvest --catalog catalog.json \
///     --corpus corpus/vnexpress_articles.jsonl \
///     --csv corpus/vnexpress_articles.csv
///
/// # Re-normalize an existing corpus without crawling
/// vnexpress_harvest --normalize-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the category catalog JSON file
    #[arg(long, default_value = "catalog.json")]
    pub catalog: String,

    /// Optional path to a YAML config file overriding the defaults
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to the NDJSON corpus file
    #[arg(short = 'o', long, default_value = "corpus/vnexpress_articles.jsonl")]
    pub corpus: String,

    /// Optional path for a CSV projection of the sorted corpus
    #[arg(long)]
    pub csv: Option<String>,

    /// Skip crawling; only dedup and sort the existing corpus
    #[arg(long)]
    pub normalize_only: bool,
}
