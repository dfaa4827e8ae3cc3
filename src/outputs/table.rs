//! CSV projection of the corpus.
//!
//! A pure projection with no invariants of its own: the sorted corpus
//! flattened to `category, sub_category, url, title, description,
//! content, date, words`, one row per record. Rewritten from scratch on
//! every run.

use crate::models::ArticleRecord;
use crate::outputs::StoreError;
use std::path::Path;
use tracing::info;

/// Write all records as CSV with a header row.
///
/// Columns follow the field order of [`ArticleRecord`].
pub fn write_table(records: &[ArticleRecord], path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record([
        "category",
        "sub_category",
        "url",
        "title",
        "description",
        "content",
        "date",
        "words",
    ])?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(rows = records.len(), path = %path.display(), "wrote CSV projection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, title: &str) -> ArticleRecord {
        ArticleRecord {
            category: "thoi-su".to_string(),
            sub_category: "chinh-tri".to_string(),
            url: url.to_string(),
            title: title.to_string(),
            description: "d".to_string(),
            content: "một hai ba".to_string(),
            date: "2024-06-10 10:30:00".to_string(),
            words: 3,
        }
    }

    #[test]
    fn header_and_rows_in_fixed_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");

        write_table(
            &[
                record("https://x.test/a-1.html", "Bài một"),
                record("https://x.test/a-2.html", "Bài hai"),
            ],
            &path,
        )
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(
            lines.next().unwrap(),
            "category,sub_category,url,title,description,content,date,words"
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn empty_corpus_writes_just_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        write_table(&[], &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 1);
    }
}
