use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::error::{truncate_for_log, TikiError};
use super::MarketplaceApi;
use crate::normalization::ListingPage;

const LISTING_PATH: &str = "/api/personalish/v1/blocks/listings";
const PRODUCT_PATH: &str = "/api/v2/products";
const REVIEW_PATH: &str = "/api/v2/reviews";
const REVIEW_INCLUDE: &str = "comments,contribute_info,attribute_vote_summary";
const REVIEW_SORT: &str = "score|desc,id|desc,stars|all";

/// Parameters of one category listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingQuery {
    pub category_id: u64,
    pub url_key: String,
    pub page: u32,
    pub limit: u32,
    pub sort: String,
}

impl ListingQuery {
    /// Category page the browser would be on when issuing this request.
    pub fn referer(&self) -> String {
        format!("https://tiki.vn/{}/c{}", self.url_key, self.category_id)
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category", self.category_id.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.clone()),
            ("urlKey", self.url_key.clone()),
        ]
    }
}

/// Client for the marketplace's public JSON endpoints.
///
/// Cloning is cheap: clones share one connection pool and configuration.
#[derive(Clone)]
pub struct TikiClient {
    http: Client,
    cfg: Arc<ClientConfig>,
}

impl TikiClient {
    pub fn new(cfg: ClientConfig) -> Result<Self, TikiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent)
                .map_err(|e| TikiError::Config(format!("invalid user agent: {e}")))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .gzip(true)
            .timeout(cfg.timeout)
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            cfg: Arc::new(cfg),
        })
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.cfg.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        headers: &HeaderMap,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .headers(headers.clone())
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }

    /// GET `path` and decode the body as JSON.
    ///
    /// Connection errors and retryable statuses are retried with exponential
    /// backoff. A response still rate limited after that gets one more attempt
    /// after a randomized cool-down; anything else non-2xx is returned as
    /// [`TikiError::Http`].
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        headers: HeaderMap,
    ) -> Result<Value, TikiError> {
        let url = self.url(path);
        let policy = &self.cfg.retry;
        let mut retry = 0u32;

        let (mut status, mut body) = loop {
            let t0 = Instant::now();
            match self.send_once(&url, query, &headers).await {
                Ok((status, body)) => {
                    debug!(url=%url, status=%status.as_u16(), body_len=body.len(), elapsed_ms=%t0.elapsed().as_millis(), "tiki get");
                    if policy.is_retryable(status) && retry < policy.max_retries {
                        retry += 1;
                        let delay = policy.backoff(retry);
                        warn!(url=%url, status=%status.as_u16(), retry, delay_ms=%delay.as_millis(), "tiki get transient status; backing off");
                        sleep(delay).await;
                        continue;
                    }
                    break (status, body);
                }
                Err(e) => {
                    if retry >= policy.max_retries {
                        return Err(TikiError::Net(e));
                    }
                    retry += 1;
                    let delay = policy.backoff(retry);
                    warn!(url=%url, error=%e, retry, delay_ms=%delay.as_millis(), "tiki get network error; backing off");
                    sleep(delay).await;
                }
            }
        };

        if status == StatusCode::TOO_MANY_REQUESTS {
            let pause = policy.rate_limit_pause();
            warn!(url=%url, pause_ms=%pause.as_millis(), "tiki get still rate limited; cooling down for a last try");
            sleep(pause).await;
            (status, body) = self.send_once(&url, query, &headers).await?;
        }

        if !status.is_success() {
            return Err(TikiError::Http {
                status: status.as_u16(),
                url,
                body: truncate_for_log(body, 512),
            });
        }

        serde_json::from_str(&body).map_err(|source| TikiError::Json { url, source })
    }
}

#[async_trait]
impl MarketplaceApi for TikiClient {
    async fn listing_page(&self, query: &ListingQuery) -> Result<ListingPage, TikiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        let referer = HeaderValue::from_str(&query.referer())
            .map_err(|e| TikiError::Config(format!("invalid referer: {e}")))?;
        headers.insert(REFERER, referer);

        let payload = self.get_json(LISTING_PATH, &query.params(), headers).await?;
        Ok(ListingPage::from_payload(payload))
    }

    async fn product_detail(&self, product_id: i64, spid: Option<i64>) -> Result<Value, TikiError> {
        let mut params = vec![("platform", "web".to_string()), ("version", "3".to_string())];
        if let Some(spid) = spid {
            params.push(("spid", spid.to_string()));
        }
        let path = format!("{PRODUCT_PATH}/{product_id}");
        self.get_json(&path, &params, HeaderMap::new()).await
    }

    async fn review_summary(
        &self,
        product_id: i64,
        spid: Option<i64>,
        seller_id: Option<i64>,
    ) -> Result<Value, TikiError> {
        let mut params = vec![
            ("limit", self.cfg.review_page_size.to_string()),
            ("include", REVIEW_INCLUDE.to_string()),
            ("sort", REVIEW_SORT.to_string()),
            ("page", "1".to_string()),
            ("product_id", product_id.to_string()),
        ];
        if let Some(spid) = spid {
            params.push(("spid", spid.to_string()));
        }
        if let Some(seller_id) = seller_id {
            params.push(("seller_id", seller_id.to_string()));
        }
        self.get_json(REVIEW_PATH, &params, HeaderMap::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, retries: u32) -> TikiClient {
        let cfg = ClientConfig {
            retry: RetryPolicy::immediate(retries),
            ..ClientConfig::default().with_base_url(server.uri())
        };
        TikiClient::new(cfg).unwrap()
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = TikiClient::new(ClientConfig::default().with_base_url("http://x.test/")).unwrap();
        assert_eq!(client.url("/api/v2/reviews"), "http://x.test/api/v2/reviews");
        assert_eq!(client.url("https://other/p"), "https://other/p");
    }

    #[test]
    fn listing_query_referer_uses_slug_and_id() {
        let q = ListingQuery {
            category_id: 8322,
            url_key: "nha-sach-tiki".into(),
            page: 1,
            limit: 40,
            sort: "top_seller".into(),
        };
        assert_eq!(q.referer(), "https://tiki.vn/nha-sach-tiki/c8322");
    }

    #[tokio::test]
    async fn listing_request_carries_query_and_referer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING_PATH))
            .and(query_param("category", "8322"))
            .and(query_param("page", "3"))
            .and(query_param("limit", "40"))
            .and(query_param("sort", "top_seller"))
            .and(query_param("urlKey", "nha-sach-tiki"))
            .and(header("referer", "https://tiki.vn/nha-sach-tiki/c8322"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 1 }, { "id": 2 }],
                "paging": { "last_page": 9 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let page = client
            .listing_page(&ListingQuery {
                category_id: 8322,
                url_key: "nha-sach-tiki".into(),
                page: 3,
                limit: 40,
                sort: "top_seller".into(),
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.last_page(), Some(9));
    }

    #[tokio::test]
    async fn detail_request_scopes_by_spid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/74021317"))
            .and(query_param("platform", "web"))
            .and(query_param("version", "3"))
            .and(query_param("spid", "74021318"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 74021317 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let v = client.product_detail(74021317, Some(74021318)).await.unwrap();
        assert_eq!(v["id"], json!(74021317));
    }

    #[tokio::test]
    async fn review_request_carries_fixed_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(REVIEW_PATH))
            .and(query_param("limit", "5"))
            .and(query_param("include", REVIEW_INCLUDE))
            .and(query_param("sort", REVIEW_SORT))
            .and(query_param("page", "1"))
            .and(query_param("product_id", "11"))
            .and(query_param("seller_id", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rating_average": 5 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let v = client.review_summary(11, None, Some(1)).await.unwrap();
        assert_eq!(v["rating_average"], json!(5));
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/5"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        let v = client.product_detail(5, None).await.unwrap();
        assert_eq!(v["ok"], json!(true));
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 5);
        let err = client.product_detail(404, None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn persistent_rate_limit_gets_one_extra_try() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(REVIEW_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(3) // first send + one retry + cool-down retry
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let err = client.review_summary(1, None, None).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn non_json_body_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let err = client.product_detail(7, None).await.unwrap_err();
        assert!(matches!(err, TikiError::Json { .. }));
    }

    #[tokio::test]
    async fn connection_refused_surfaces_as_net_error_after_retries() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let cfg = ClientConfig {
            retry: RetryPolicy::immediate(2),
            ..ClientConfig::default().with_base_url(format!("http://127.0.0.1:{port}"))
        };
        let client = TikiClient::new(cfg).unwrap();

        let err = client.product_detail(9, None).await.unwrap_err();
        assert!(matches!(err, TikiError::Net(_)), "unexpected error: {err}");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn timeouts_are_retried_then_surface_as_net_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/products/8"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": 8 }))
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .expect(3) // first send + max_retries
            .mount(&server)
            .await;

        let cfg = ClientConfig {
            retry: RetryPolicy::immediate(2),
            timeout: std::time::Duration::from_millis(100),
            ..ClientConfig::default().with_base_url(server.uri())
        };
        let client = TikiClient::new(cfg).unwrap();

        let err = client.product_detail(8, None).await.unwrap_err();
        match err {
            TikiError::Net(e) => assert!(e.is_timeout(), "expected a timeout, got {e}"),
            other => panic!("expected a network error, got {other}"),
        }
    }
}
