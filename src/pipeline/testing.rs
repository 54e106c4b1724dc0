//! In-memory `MarketplaceApi` used by the pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::{ListingQuery, MarketplaceApi, TikiError};
use crate::normalization::ListingPage;

#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub pages: Vec<u32>,
    pub details: Vec<(i64, Option<i64>)>,
    pub reviews: Vec<(i64, Option<i64>, Option<i64>)>,
}

#[derive(Default)]
pub struct FakeApi {
    pages: HashMap<u32, Value>,
    failing_pages: HashSet<u32>,
    details: HashMap<i64, Value>,
    reviews: HashMap<i64, Value>,
    failing_details: HashSet<i64>,
    failing_reviews: HashSet<i64>,
    panicking_details: HashSet<i64>,
    latency: Duration,
    calls: Mutex<Calls>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn server_error(what: &str) -> TikiError {
    TikiError::Http {
        status: 500,
        url: format!("fake://{what}"),
        body: "boom".into(),
    }
}

impl FakeApi {
    /// Listing page `page` holding products with the given ids.
    pub fn with_page(mut self, page: u32, ids: &[i64]) -> Self {
        let data: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "id": id, "name": format!("product {id}"), "seller_product_id": id + 1 }))
            .collect();
        self.pages.insert(page, json!({ "data": data, "paging": {} }));
        self
    }

    pub fn with_raw_page(mut self, page: u32, payload: Value) -> Self {
        self.pages.insert(page, payload);
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn with_detail(mut self, id: i64, payload: Value) -> Self {
        self.details.insert(id, payload);
        self
    }

    pub fn with_review(mut self, id: i64, payload: Value) -> Self {
        self.reviews.insert(id, payload);
        self
    }

    pub fn failing_detail(mut self, id: i64) -> Self {
        self.failing_details.insert(id);
        self
    }

    pub fn failing_review(mut self, id: i64) -> Self {
        self.failing_reviews.insert(id);
        self
    }

    pub fn panicking_detail(mut self, id: i64) -> Self {
        self.panicking_details.insert(id);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
    async fn listing_page(&self, query: &ListingQuery) -> Result<ListingPage, TikiError> {
        self.calls.lock().unwrap().pages.push(query.page);
        if self.failing_pages.contains(&query.page) {
            return Err(server_error("listing"));
        }
        let payload = self.pages.get(&query.page).cloned().unwrap_or_else(|| json!({ "data": [] }));
        Ok(ListingPage::from_payload(payload))
    }

    async fn product_detail(&self, product_id: i64, spid: Option<i64>) -> Result<Value, TikiError> {
        self.calls.lock().unwrap().details.push((product_id, spid));
        if self.panicking_details.contains(&product_id) {
            panic!("detail handler blew up for {product_id}");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_details.contains(&product_id) {
            return Err(server_error("detail"));
        }
        Ok(self.details.get(&product_id).cloned().unwrap_or_else(|| json!({})))
    }

    async fn review_summary(
        &self,
        product_id: i64,
        spid: Option<i64>,
        seller_id: Option<i64>,
    ) -> Result<Value, TikiError> {
        self.calls
            .lock()
            .unwrap()
            .reviews
            .push((product_id, spid, seller_id));
        if self.failing_reviews.contains(&product_id) {
            return Err(server_error("review"));
        }
        Ok(self.reviews.get(&product_id).cloned().unwrap_or_else(|| json!({})))
    }
}
