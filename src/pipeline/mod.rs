//! Crawl pipeline: page walking and per-item enrichment.

pub mod driver;
pub mod enrich;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{crawl, CrawlReport, ItemFailure};
pub use enrich::{enrich_one, ItemError};
