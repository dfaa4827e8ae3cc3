//! The category catalog.
//!
//! The catalog is a JSON object mapping each category to its ordered
//! list of subcategories:
//!
//! ```json
//! {
//!   "thoi-su": ["chinh-tri", "dan-sinh", "giao-thong"],
//!   "the-gioi": ["tu-lieu", "phan-tich", "quan-su"]
//! }
//! ```
//!
//! It is loaded once per run and immutable thereafter. Key order is
//! significant: a category's position in the file (and a subcategory's
//! position in its list) defines its rank in the canonical corpus
//! ordering, which is why parsing goes through `serde_json`'s
//! order-preserving map.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Rank assigned to categories and subcategories missing from the
/// catalog; sorts after every real rank.
pub const UNRANKED: usize = usize::MAX;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog entry {0:?} is not an array of strings")]
    Shape(String),
}

/// Ordered category → subcategories mapping with rank lookups.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<(String, Vec<String>)>,
    category_rank: HashMap<String, usize>,
    subcategory_rank: HashMap<String, HashMap<String, usize>>,
}

impl Catalog {
    /// Load the catalog from a JSON file, preserving key order.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let map: serde_json::Map<String, Value> = serde_json::from_str(&raw)?;

        let mut entries = Vec::with_capacity(map.len());
        for (category, subcategories) in map {
            let Some(list) = subcategories.as_array() else {
                return Err(CatalogError::Shape(category));
            };
            let mut names = Vec::with_capacity(list.len());
            for entry in list {
                match entry.as_str() {
                    Some(name) => names.push(name.to_string()),
                    None => return Err(CatalogError::Shape(category)),
                }
            }
            entries.push((category, names));
        }

        Ok(Self::from_entries(entries))
    }

    /// Build a catalog from already ordered entries.
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        let mut category_rank = HashMap::new();
        let mut subcategory_rank: HashMap<String, HashMap<String, usize>> = HashMap::new();

        for (cat_idx, (category, subcategories)) in entries.iter().enumerate() {
            category_rank.insert(category.clone(), cat_idx);
            let ranks = subcategory_rank.entry(category.clone()).or_default();
            for (sub_idx, subcategory) in subcategories.iter().enumerate() {
                ranks.entry(subcategory.clone()).or_insert(sub_idx);
            }
        }

        Self {
            entries,
            category_rank,
            subcategory_rank,
        }
    }

    /// Every (category, subcategory) pair in catalog order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(category, subcategories)| {
            subcategories
                .iter()
                .map(move |sub| (category.as_str(), sub.as_str()))
        })
    }

    /// Number of (category, subcategory) pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|(_, subs)| subs.len()).sum()
    }

    pub fn category_rank(&self, category: &str) -> usize {
        self.category_rank.get(category).copied().unwrap_or(UNRANKED)
    }

    pub fn subcategory_rank(&self, category: &str, subcategory: &str) -> usize {
        self.subcategory_rank
            .get(category)
            .and_then(|ranks| ranks.get(subcategory))
            .copied()
            .unwrap_or(UNRANKED)
    }
}
