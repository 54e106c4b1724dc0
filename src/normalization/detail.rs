use serde_json::Value;

use super::json::{fmt_fields, fmt_kv, render_value, ValueExt};

const AMPLITUDE_KEYS: [&str; 5] = [
    "is_authentic",
    "is_freeship_xtra",
    "is_hero",
    "is_top_brand",
    "return_reason",
];
const SELLER_KEYS: [&str; 6] = [
    "id",
    "sku",
    "name",
    "store_id",
    "is_best_store",
    "is_offline_installment_supported",
];
const STOCK_KEYS: [&str; 3] = ["max_sale_qty", "min_sale_qty", "qty"];
const CATEGORY_KEYS: [&str; 3] = ["id", "name", "is_leaf"];

/// Flat projection of a product detail payload.
///
/// Formatted fields are `""` when their source object is absent; passthrough
/// scalars stay `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailFields {
    pub tracking_info_amplitude: String,
    pub inventory_status: Value,
    pub inventory_type: Value,
    pub data_version: Value,
    pub day_ago_created: Value,
    pub brand_or_author: String,
    pub current_seller: String,
    pub stock_item: String,
    pub categories: String,
    pub benefits_count: u64,
}

impl Default for DetailFields {
    fn default() -> Self {
        parse_detail_fields(&Value::Null)
    }
}

pub fn parse_detail_fields(detail: &Value) -> DetailFields {
    DetailFields {
        tracking_info_amplitude: amplitude(detail),
        inventory_status: detail.field("inventory_status").clone(),
        inventory_type: detail.field("inventory_type").clone(),
        data_version: detail.field("data_version").clone(),
        day_ago_created: detail.field("day_ago_created").clone(),
        brand_or_author: brand_or_author(detail),
        current_seller: object_kv(detail.field("current_seller"), &SELLER_KEYS),
        stock_item: object_kv(detail.field("stock_item"), &STOCK_KEYS),
        categories: leaf_category(detail.field("categories")),
        benefits_count: benefits_count(detail.field("benefits")),
    }
}

fn object_kv(v: &Value, keys: &[&str]) -> String {
    if v.is_object() {
        fmt_fields(v, keys)
    } else {
        String::new()
    }
}

fn amplitude(detail: &Value) -> String {
    object_kv(detail.field("tracking_info").field("amplitude"), &AMPLITUDE_KEYS)
}

/// Authors win over brand whenever the `authors` list has any entry at all.
fn brand_or_author(detail: &Value) -> String {
    if let Some(authors) = detail.field("authors").as_array().filter(|a| !a.is_empty()) {
        let mut ids: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for author in authors.iter().filter(|a| a.is_object()) {
            let id = author.field("id");
            if !id.is_null() {
                ids.push(render_value(id));
            }
            if let Some(name) = non_empty_name(author.field("name")) {
                names.push(name);
            }
        }
        let joined = |parts: Vec<String>, sep: &str| {
            if parts.is_empty() {
                Value::Null
            } else {
                Value::String(parts.join(sep))
            }
        };
        return fmt_kv(&[("id", joined(ids, ",")), ("name", joined(names, ", "))]);
    }

    object_kv(detail.field("brand"), &["id", "name"])
}

fn non_empty_name(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(render_value(other)),
    }
}

/// `categories` may be one object or a path of objects; the path's last entry is the leaf.
fn leaf_category(v: &Value) -> String {
    match v {
        Value::Object(_) => fmt_fields(v, &CATEGORY_KEYS),
        Value::Array(path) => match path.last() {
            Some(leaf) if leaf.is_object() => fmt_fields(leaf, &CATEGORY_KEYS),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn benefits_count(v: &Value) -> u64 {
    match v {
        Value::Array(a) => a.len() as u64,
        Value::Object(o) => o.len() as u64,
        _ => 0,
    }
}
