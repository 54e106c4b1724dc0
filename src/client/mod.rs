//! HTTP access to the marketplace listing, product and review endpoints.

pub mod config;
pub mod error;
pub mod tiki;

use async_trait::async_trait;
use serde_json::Value;

use crate::normalization::ListingPage;

pub use config::{ClientConfig, RetryPolicy};
pub use error::TikiError;
pub use tiki::{ListingQuery, TikiClient};

/// The three calls the crawl pipeline makes. [`TikiClient`] is the real
/// implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// One page of a category listing.
    async fn listing_page(&self, query: &ListingQuery) -> Result<ListingPage, TikiError>;

    /// Product detail payload, optionally scoped to one seller offer (`spid`).
    async fn product_detail(&self, product_id: i64, spid: Option<i64>) -> Result<Value, TikiError>;

    /// First page of reviews; only its summary fields are used.
    async fn review_summary(
        &self,
        product_id: i64,
        spid: Option<i64>,
        seller_id: Option<i64>,
    ) -> Result<Value, TikiError>;
}
