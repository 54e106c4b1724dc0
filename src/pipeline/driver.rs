use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::enrich::{enrich_one, ItemError};
use crate::client::MarketplaceApi;
use crate::config::{CrawlConfig, FailurePolicy};
use crate::normalization::{ListingItem, OutputRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub product_id: Option<i64>,
    pub page: u32,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Rows in completion order; not listing order.
    pub rows: Vec<OutputRow>,
    pub pages_fetched: u32,
    pub items_seen: usize,
    pub failures: Vec<ItemFailure>,
    /// Why paging stopped before the configured range, when it was an error.
    pub halted: Option<String>,
}

/// Walk the configured page range, enriching every listed item.
///
/// Pages are strictly sequential; items within a page are enriched on spawned
/// tasks with at most `cfg.workers` in flight. An empty page ends the crawl.
pub async fn crawl(api: Arc<dyn MarketplaceApi>, cfg: &CrawlConfig) -> Result<CrawlReport> {
    let mut report = CrawlReport::default();

    for page in cfg.pages() {
        let query = cfg.listing_query(page);
        let listing = match api.listing_page(&query).await {
            Ok(listing) => listing,
            Err(e) => {
                if cfg.failure_policy == FailurePolicy::AbortRun {
                    return Err(anyhow!(e).context(format!("listing page {page}")));
                }
                error!(page, error=%e, rows = report.rows.len(), "listing page failed; stopping with rows gathered so far");
                report.halted = Some(format!("listing page {page}: {e}"));
                break;
            }
        };
        report.pages_fetched += 1;

        if listing.items.is_empty() {
            info!(page, "listing page empty; end of results");
            break;
        }
        let last_page = listing.last_page();
        info!(page, items = listing.items.len(), paging=%listing.paging, "listing page fetched");
        report.items_seen += listing.items.len();

        let mut first_error: Option<ItemError> = None;
        for outcome in enrich_page(&api, listing.items, cfg.workers).await {
            match outcome {
                Ok(row) => report.rows.push(row),
                Err(e) => {
                    warn!(page, product_id = ?e.product_id(), error=%e, "item enrichment failed");
                    report.failures.push(ItemFailure {
                        product_id: e.product_id(),
                        page,
                        error: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }
        if let (FailurePolicy::AbortRun, Some(e)) = (cfg.failure_policy, first_error) {
            return Err(anyhow!(e).context(format!("enriching listing page {page}")));
        }
        info!(page, rows = report.rows.len(), failures = report.failures.len(), "page done");

        if page >= cfg.end_page {
            break;
        }
        if let Some(last) = last_page.filter(|last| page >= *last) {
            info!(page, last_page = last, "reached last listing page");
            break;
        }
        let pause = cfg.page_delay();
        debug!(page, pause_ms = %pause.as_millis(), "pausing before next page");
        sleep(pause).await;
    }

    info!(
        pages = report.pages_fetched,
        items = report.items_seen,
        rows = report.rows.len(),
        failures = report.failures.len(),
        halted = report.halted.is_some(),
        "crawl finished"
    );
    Ok(report)
}

/// Enrich one page's items, `workers` at a time, returning results as they complete.
async fn enrich_page(
    api: &Arc<dyn MarketplaceApi>,
    items: Vec<ListingItem>,
    workers: usize,
) -> Vec<Result<OutputRow, ItemError>> {
    let sem = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    for item in items {
        let api = Arc::clone(api);
        let sem = Arc::clone(&sem);
        tasks.spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            enrich_one(api.as_ref(), &item).await
        });
    }

    let mut out = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        out.push(joined.unwrap_or_else(|e| Err(ItemError::Task(e.to_string()))));
    }
    out
}
