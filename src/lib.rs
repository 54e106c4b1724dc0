//! Category crawler for the Tiki marketplace: walks listing pages, enriches each
//! product with its detail and review summary, and flattens everything into one
//! CSV row per product.

pub mod client;
pub mod config;
pub mod export;
pub mod normalization;
pub mod pipeline;

pub mod util {
    pub mod env;
    pub mod logging;
}

pub use client::{ClientConfig, MarketplaceApi, TikiClient, TikiError};
pub use config::{CrawlCommandConfig, CrawlConfig, FailurePolicy};
pub use export::write_csv;
pub use normalization::OutputRow;
pub use pipeline::{crawl, CrawlReport};
