use serde_json::Value;

use super::json::ValueExt;

/// One product summary from a category listing page, kept as the raw JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem(Value);

impl ListingItem {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Raw field, `Null` when missing.
    pub fn get(&self, key: &str) -> &Value {
        self.0.field(key)
    }

    pub fn product_id(&self) -> Option<i64> {
        self.get("id").as_id()
    }

    pub fn seller_product_id(&self) -> Option<i64> {
        self.get("seller_product_id").as_id()
    }

    pub fn seller_id(&self) -> Option<i64> {
        self.get("seller_id").as_id()
    }
}

/// One listing response: the items plus the untouched `paging` block.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub items: Vec<ListingItem>,
    pub paging: Value,
}

impl ListingPage {
    /// Split a listing response. A missing or non-array `data` is an empty page.
    pub fn from_payload(payload: Value) -> Self {
        let mut payload = payload;
        let items = match payload.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items.into_iter().map(ListingItem::new).collect(),
            _ => Vec::new(),
        };
        let paging = payload
            .get_mut("paging")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Self { items, paging }
    }

    pub fn last_page(&self) -> Option<u32> {
        self.paging
            .field("last_page")
            .as_id()
            .and_then(|n| u32::try_from(n).ok())
    }
}

/// `quantity_sold` is `{"text": "Đã bán 120", "value": 120}` on listing surfaces and a
/// plain number elsewhere; unwrap the former, pass the latter through.
pub fn normalize_quantity_sold(raw: &Value) -> Value {
    if raw.is_object() {
        raw.field("value").clone()
    } else {
        raw.clone()
    }
}
