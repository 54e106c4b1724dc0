use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use tiki_crawl::util::env::{init_env, preflight_check};
use tiki_crawl::util::logging::{init_tracing, LogStyle};
use tiki_crawl::{crawl, write_csv, ClientConfig, CrawlCommandConfig, CrawlConfig, TikiClient};

#[derive(Parser, Debug)]
#[command(
    name = "tiki-crawl",
    version,
    about = "Crawl a Tiki category and export enriched product rows to CSV"
)]
struct Cli {
    /// Numeric category id (TIKI_CATEGORY_ID, default 8322)
    #[arg(long)]
    category_id: Option<u64>,
    /// Category url key / slug (TIKI_CATEGORY_SLUG, default nha-sach-tiki)
    #[arg(long)]
    category_slug: Option<String>,
    /// First listing page, 1-based (TIKI_START_PAGE)
    #[arg(long)]
    start_page: Option<u32>,
    /// Last listing page, inclusive (TIKI_END_PAGE)
    #[arg(long)]
    end_page: Option<u32>,
    /// Items per listing page (TIKI_PAGE_SIZE, default 40)
    #[arg(long)]
    page_size: Option<u32>,
    /// Listing sort key (TIKI_SORT, default top_seller)
    #[arg(long)]
    sort: Option<String>,
    /// Output file name; `.csv` is appended when missing (TIKI_OUTPUT)
    #[arg(long, short)]
    output: Option<String>,
    /// Concurrent item enrichments per page (TIKI_WORKERS, default 10)
    #[arg(long)]
    workers: Option<usize>,
    /// Lower bound of the pause between pages, ms (TIKI_PAGE_DELAY_MIN_MS)
    #[arg(long)]
    delay_min_ms: Option<u64>,
    /// Upper bound of the pause between pages, ms (TIKI_PAGE_DELAY_MAX_MS)
    #[arg(long)]
    delay_max_ms: Option<u64>,
    /// Abort on the first failed item instead of skipping it (TIKI_FAIL_FAST)
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

impl From<Cli> for CrawlCommandConfig {
    fn from(cli: Cli) -> Self {
        Self {
            category_id: cli.category_id,
            category_slug: cli.category_slug,
            start_page: cli.start_page,
            end_page: cli.end_page,
            page_size: cli.page_size,
            sort: cli.sort,
            output: cli.output,
            workers: cli.workers,
            delay_min_ms: cli.delay_min_ms,
            delay_max_ms: cli.delay_max_ms,
            fail_fast: cli.fail_fast,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env();
    init_tracing("info", LogStyle::from_env())?;
    let cli = Cli::parse();

    preflight_check(
        "tiki-crawl",
        &[],
        &[
            "TIKI_BASE_URL",
            "TIKI_CATEGORY_ID",
            "TIKI_CATEGORY_SLUG",
            "TIKI_START_PAGE",
            "TIKI_END_PAGE",
            "TIKI_WORKERS",
            "TIKI_OUTPUT",
        ],
    )?;

    let cfg = CrawlConfig::resolve(cli.into());
    cfg.validate().context("invalid crawl configuration")?;
    let client = TikiClient::new(ClientConfig::from_env()).context("building http client")?;
    info!(
        category_id = cfg.category_id,
        slug = %cfg.category_slug,
        pages = ?cfg.pages(),
        workers = cfg.workers,
        policy = ?cfg.failure_policy,
        "starting crawl"
    );

    let report = crawl(Arc::new(client), &cfg).await?;
    let path = cfg.output_path();
    write_csv(&path, &report.rows)?;

    println!(
        "Exported {} rows from {} page(s) to {} ({} failed item(s))",
        report.rows.len(),
        report.pages_fetched,
        path.display(),
        report.failures.len()
    );
    if let Some(reason) = report.halted {
        error!(reason = %reason, "crawl stopped early; export is partial");
        bail!("crawl stopped early: {reason}");
    }
    Ok(())
}
