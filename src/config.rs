use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use rand::Rng;

use crate::client::ListingQuery;
use crate::util::env::{env_flag, env_opt, env_parse};

/// What to do when enriching one listing item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failing product id, leave it out of the export, keep going.
    #[default]
    SkipItem,
    /// Stop the crawl with the first item error once the current page has drained.
    AbortRun,
}

/// CLI-level overrides; `None` falls back to env, then to the built-in default.
#[derive(Debug, Clone, Default)]
pub struct CrawlCommandConfig {
    pub category_id: Option<u64>,
    pub category_slug: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
    pub output: Option<String>,
    pub workers: Option<usize>,
    pub delay_min_ms: Option<u64>,
    pub delay_max_ms: Option<u64>,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub category_id: u64,
    /// `urlKey` of the category, e.g. `nha-sach-tiki`.
    pub category_slug: String,
    pub start_page: u32,
    /// Inclusive.
    pub end_page: u32,
    pub page_size: u32,
    pub sort: String,
    /// Output file name without the `.csv` extension.
    pub output_stem: String,
    pub workers: usize,
    pub page_delay_min_ms: u64,
    pub page_delay_max_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            category_id: 8322,
            category_slug: "nha-sach-tiki".into(),
            start_page: 1,
            end_page: 2,
            page_size: 40,
            sort: "top_seller".into(),
            output_stem: "tiki_library".into(),
            workers: 10,
            page_delay_min_ms: 1000,
            page_delay_max_ms: 2500,
            failure_policy: FailurePolicy::SkipItem,
        }
    }
}

impl CrawlConfig {
    pub fn resolve(cli: CrawlCommandConfig) -> Self {
        let d = Self::default();
        let fail_fast = cli.fail_fast || env_flag("TIKI_FAIL_FAST", false);
        Self {
            category_id: cli
                .category_id
                .unwrap_or_else(|| env_parse("TIKI_CATEGORY_ID", d.category_id)),
            category_slug: cli
                .category_slug
                .or_else(|| env_opt("TIKI_CATEGORY_SLUG"))
                .unwrap_or(d.category_slug),
            start_page: cli
                .start_page
                .unwrap_or_else(|| env_parse("TIKI_START_PAGE", d.start_page)),
            end_page: cli
                .end_page
                .unwrap_or_else(|| env_parse("TIKI_END_PAGE", d.end_page)),
            page_size: cli
                .page_size
                .unwrap_or_else(|| env_parse("TIKI_PAGE_SIZE", d.page_size)),
            sort: cli
                .sort
                .or_else(|| env_opt("TIKI_SORT"))
                .unwrap_or(d.sort),
            output_stem: cli
                .output
                .or_else(|| env_opt("TIKI_OUTPUT"))
                .unwrap_or(d.output_stem),
            workers: cli
                .workers
                .unwrap_or_else(|| env_parse("TIKI_WORKERS", d.workers)),
            page_delay_min_ms: cli
                .delay_min_ms
                .unwrap_or_else(|| env_parse("TIKI_PAGE_DELAY_MIN_MS", d.page_delay_min_ms)),
            page_delay_max_ms: cli
                .delay_max_ms
                .unwrap_or_else(|| env_parse("TIKI_PAGE_DELAY_MAX_MS", d.page_delay_max_ms)),
            failure_policy: if fail_fast {
                FailurePolicy::AbortRun
            } else {
                FailurePolicy::SkipItem
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.category_slug.trim().is_empty() {
            bail!("category slug must not be empty");
        }
        if self.start_page == 0 {
            bail!("pages are 1-based; start_page must be >= 1");
        }
        if self.start_page > self.end_page {
            bail!(
                "start_page ({}) is after end_page ({})",
                self.start_page,
                self.end_page
            );
        }
        if self.page_size == 0 {
            bail!("page_size must be > 0");
        }
        if self.workers == 0 {
            bail!("workers must be > 0");
        }
        if self.page_delay_min_ms > self.page_delay_max_ms {
            bail!(
                "page delay bounds inverted: min {}ms > max {}ms",
                self.page_delay_min_ms,
                self.page_delay_max_ms
            );
        }
        Ok(())
    }

    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start_page..=self.end_page
    }

    pub fn output_path(&self) -> PathBuf {
        let stem = self.output_stem.trim();
        if stem.to_ascii_lowercase().ends_with(".csv") {
            PathBuf::from(stem)
        } else {
            PathBuf::from(format!("{stem}.csv"))
        }
    }

    pub fn listing_query(&self, page: u32) -> ListingQuery {
        ListingQuery {
            category_id: self.category_id,
            url_key: self.category_slug.clone(),
            page,
            limit: self.page_size,
            sort: self.sort.clone(),
        }
    }

    /// Uniformly random pause between listing pages.
    pub fn page_delay(&self) -> Duration {
        let (lo, hi) = (self.page_delay_min_ms, self.page_delay_max_ms);
        let ms = if lo >= hi {
            lo
        } else {
            rand::thread_rng().gen_range(lo..=hi)
        };
        Duration::from_millis(ms)
    }
}
