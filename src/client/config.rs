use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;

use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_BASE_URL: &str = "https://tiki.vn";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:147.0) Gecko/20100101 Firefox/147.0";

/// Status-based retry with exponential backoff, plus one extra cool-down retry on 429.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Retries after the first attempt (so `max_retries + 1` sends at most).
    pub max_retries: u32,
    /// First backoff; doubled after every retry.
    pub base_delay: Duration,
    pub retry_statuses: Vec<u16>,
    /// Fixed part of the pause before the final 429 retry.
    pub rate_limit_cooldown: Duration,
    /// Upper bound of the random part added to `rate_limit_cooldown`.
    pub rate_limit_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            retry_statuses: vec![429, 500, 502, 503, 504],
            rate_limit_cooldown: Duration::from_millis(1000),
            rate_limit_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_retries: env_parse("TIKI_RETRY_ATTEMPTS", d.max_retries),
            base_delay: Duration::from_millis(env_parse(
                "TIKI_RETRY_BASE_DELAY_MS",
                d.base_delay.as_millis() as u64,
            )),
            ..d
        }
    }

    /// Policy without any waiting, for tests against local servers.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
            rate_limit_jitter: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        let jitter_ms = self.rate_limit_jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.rate_limit_cooldown + Duration::from_millis(extra)
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout (connect + body).
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry: RetryPolicy,
    /// `limit` sent to the review endpoint; only the summary fields are used.
    pub review_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 50,
            retry: RetryPolicy::default(),
            review_page_size: 5,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: env_opt("TIKI_BASE_URL").unwrap_or(d.base_url),
            user_agent: env_opt("TIKI_USER_AGENT").unwrap_or(d.user_agent),
            timeout: Duration::from_secs(env_parse("TIKI_HTTP_TIMEOUT_SECS", 30u64)),
            pool_max_idle_per_host: env_parse("TIKI_POOL_MAX_IDLE", d.pool_max_idle_per_host),
            retry: RetryPolicy::from_env(),
            review_page_size: env_parse("TIKI_REVIEW_LIMIT", d.review_page_size),
        }
    }

    /// Point the client at another origin (mock servers, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
