//! Corpus persistence and derived exports.
//!
//! # Submodules
//!
//! - [`jsonl`]: the NDJSON corpus — incremental appends, tolerant
//!   loading, and atomic full rewrites
//! - [`table`]: CSV projection of the corpus in a fixed column order
//!
//! # On-disk layout
//!
//! ```text
//! corpus/
//! ├── vnexpress_articles.jsonl   # one ArticleRecord per line
//! └── vnexpress_articles.csv     # derived projection, rewritten per run
//! ```

use thiserror::Error;

pub mod jsonl;
pub mod table;

/// Error produced while reading or writing corpus files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corpus io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corpus serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
}
