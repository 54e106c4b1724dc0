use thiserror::Error;
use tracing::debug;

use crate::client::{MarketplaceApi, TikiError};
use crate::normalization::{parse_detail_fields, parse_review_fields, ListingItem, OutputRow};

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("listing item has no usable product id")]
    MissingProductId,
    #[error("product {product_id}: detail fetch failed: {source}")]
    Detail {
        product_id: i64,
        #[source]
        source: TikiError,
    },
    #[error("product {product_id}: review fetch failed: {source}")]
    Review {
        product_id: i64,
        #[source]
        source: TikiError,
    },
    #[error("enrichment task failed: {0}")]
    Task(String),
}

impl ItemError {
    pub fn product_id(&self) -> Option<i64> {
        match self {
            ItemError::MissingProductId | ItemError::Task(_) => None,
            ItemError::Detail { product_id, .. } | ItemError::Review { product_id, .. } => {
                Some(*product_id)
            }
        }
    }
}

/// Fetch detail then reviews for one listing item and merge them into a row.
pub async fn enrich_one(
    api: &dyn MarketplaceApi,
    item: &ListingItem,
) -> Result<OutputRow, ItemError> {
    let product_id = item.product_id().ok_or(ItemError::MissingProductId)?;
    let spid = item.seller_product_id();
    let seller_id = item.seller_id();

    let detail = api
        .product_detail(product_id, spid)
        .await
        .map_err(|source| ItemError::Detail { product_id, source })?;
    let review = api
        .review_summary(product_id, spid, seller_id)
        .await
        .map_err(|source| ItemError::Review { product_id, source })?;

    debug!(product_id, ?spid, ?seller_id, "item enriched");
    Ok(OutputRow::assemble(
        item,
        parse_detail_fields(&detail),
        parse_review_fields(&review),
    ))
}
