use serde_json::Value;

use super::detail::DetailFields;
use super::json::{render_cell, ValueExt};
use super::listing::{normalize_quantity_sold, ListingItem};
use super::review::ReviewFields;

/// One exported line: listing fields + normalized detail + normalized review.
///
/// Every row carries the same columns whatever the payload shapes were.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    // identity
    pub id: Value,
    pub sku: Value,
    pub name: Value,
    pub seller_product_id: Value,
    pub seller_id: Value,

    pub detail: DetailFields,
    pub review: ReviewFields,

    // grouping
    pub productset_id: Value,
    pub primary_category_path: Value,

    // pricing
    pub price: Value,
    pub original_price: Value,
    pub discount: Value,
    pub discount_rate: Value,

    pub favourite_count: Value,
    pub badges_new: Value,
    pub badges_v3: Value,

    // sales / exposure
    pub quantity_sold: Value,
    pub product_reco_score: Value,

    pub availability: Value,
    pub shippable: Value,
}

impl OutputRow {
    pub const HEADERS: [&'static str; 31] = [
        "id",
        "sku",
        "name",
        "seller_product_id",
        "seller_id",
        "tracking_info_amplitude",
        "inventory_status",
        "inventory_type",
        "data_version",
        "day_ago_created",
        "brand_or_author",
        "current_seller",
        "stock_item",
        "categories",
        "benefits_count",
        "rating_average",
        "reviews_count",
        "stars",
        "productset_id",
        "primary_category_path",
        "price",
        "original_price",
        "discount",
        "discount_rate",
        "favourite_count",
        "badges_new",
        "badges_v3",
        "quantity_sold",
        "product_reco_score",
        "availability",
        "shippable",
    ];

    pub fn assemble(item: &ListingItem, detail: DetailFields, review: ReviewFields) -> Self {
        let take = |key: &str| item.get(key).clone();
        Self {
            id: take("id"),
            sku: take("sku"),
            name: take("name"),
            seller_product_id: take("seller_product_id"),
            seller_id: take("seller_id"),
            detail,
            review,
            productset_id: take("productset_id"),
            primary_category_path: take("primary_category_path"),
            price: take("price"),
            original_price: take("original_price"),
            discount: take("discount"),
            discount_rate: take("discount_rate"),
            favourite_count: take("favourite_count"),
            badges_new: take("badges_new"),
            badges_v3: take("badges_v3"),
            quantity_sold: normalize_quantity_sold(item.get("quantity_sold")),
            product_reco_score: take("product_reco_score"),
            availability: take("availability"),
            shippable: take("shippable"),
        }
    }

    /// Cells in [`OutputRow::HEADERS`] order.
    pub fn record(&self) -> Vec<String> {
        let d = &self.detail;
        let r = &self.review;
        vec![
            render_cell(&self.id),
            render_cell(&self.sku),
            render_cell(&self.name),
            render_cell(&self.seller_product_id),
            render_cell(&self.seller_id),
            d.tracking_info_amplitude.clone(),
            render_cell(&d.inventory_status),
            render_cell(&d.inventory_type),
            render_cell(&d.data_version),
            render_cell(&d.day_ago_created),
            d.brand_or_author.clone(),
            d.current_seller.clone(),
            d.stock_item.clone(),
            d.categories.clone(),
            d.benefits_count.to_string(),
            render_cell(&r.rating_average),
            render_cell(&r.reviews_count),
            r.stars.clone(),
            render_cell(&self.productset_id),
            render_cell(&self.primary_category_path),
            render_cell(&self.price),
            render_cell(&self.original_price),
            render_cell(&self.discount),
            render_cell(&self.discount_rate),
            render_cell(&self.favourite_count),
            render_cell(&self.badges_new),
            render_cell(&self.badges_v3),
            render_cell(&self.quantity_sold),
            render_cell(&self.product_reco_score),
            render_cell(&self.availability),
            render_cell(&self.shippable),
        ]
    }

    pub fn product_id(&self) -> Option<i64> {
        self.id.as_id()
    }
}
