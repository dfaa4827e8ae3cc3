//! The three crawl stages, run in order.
//!
//! | Stage | Module | Concurrency | Output |
//! |-------|--------|-------------|--------|
//! | 1. Validation | [`validate`] | sequential | accepted category/subcategory pairs |
//! | 2. URL collection | [`collect`] | sequential | candidate article URLs |
//! | 3. Detail crawl | [`crawl`] | bounded pool | accepted article records |
//!
//! The first two stages are deliberately sequential to keep discovery
//! load low; only the detail crawl parallelizes. Failures in an earlier
//! stage shrink the input of later stages but never abort the run, and
//! every stage returns partial results on a user interrupt.

pub mod collect;
pub mod crawl;
pub mod validate;
