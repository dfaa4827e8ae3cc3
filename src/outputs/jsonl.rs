//! The NDJSON corpus store.
//!
//! The corpus is an append-only log of one JSON object per line.
//! Incremental runs append today's new records; normalization
//! (dedup + sort) rewrites the whole file atomically through a sibling
//! temp file. Loading tolerates malformed individual lines: corruption
//! of one record must never abort loading the rest.

use crate::models::ArticleRecord;
use crate::outputs::StoreError;
use crate::utils::truncate_for_log;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// The set of article URLs already present in the corpus.
///
/// Only the `url` field of each line is inspected, so records written
/// by older schema versions still count as known. A missing file is an
/// empty corpus, not an error.
pub async fn load_known_urls(path: &Path) -> HashSet<String> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return HashSet::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read corpus; treating as empty");
            return HashSet::new();
        }
    };

    let mut urls = HashSet::new();
    let mut skipped = 0usize;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => match value.get("url").and_then(|url| url.as_str()) {
                Some(url) => {
                    urls.insert(url.to_string());
                }
                None => skipped += 1,
            },
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, path = %path.display(), "skipped malformed corpus lines");
    }
    urls
}

/// Load the full corpus, skipping malformed lines.
pub async fn load_corpus(path: &Path) -> Vec<ArticleRecord> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read corpus; treating as empty");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ArticleRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, line = %truncate_for_log(line, 120), "skipping malformed corpus line");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, loaded = records.len(), path = %path.display(), "corpus contained malformed lines");
    }
    records
}

/// Append records to the corpus without touching existing content.
pub async fn append_records(records: &[ArticleRecord], path: &Path) -> Result<(), StoreError> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut buffer = String::new();
    for record in records {
        buffer.push_str(&serde_json::to_string(record)?);
        buffer.push('\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(buffer.as_bytes()).await?;
    file.flush().await?;

    info!(appended = records.len(), path = %path.display(), "appended records to corpus");
    Ok(())
}

/// Replace the corpus with `records`, atomically.
///
/// The new content is written to a sibling temp file first and renamed
/// over the target, so a crash mid-write never leaves a truncated
/// corpus behind.
pub async fn export_ordered(records: &[ArticleRecord], path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut buffer = String::new();
    for record in records {
        buffer.push_str(&serde_json::to_string(record)?);
        buffer.push('\n');
    }

    let tmp = path.with_extension("jsonl.tmp");
    tokio::fs::write(&tmp, buffer.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await?;

    info!(count = records.len(), path = %path.display(), "exported ordered corpus");
    Ok(())
}
