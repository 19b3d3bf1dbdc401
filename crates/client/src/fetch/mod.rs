//! Paginated retrieval of webmentions from the mention service.
//!
//! ### Endpoint
//! - `GET {endpoint}?domain=…&token=…&per-page=1000&page=N[&since=…]`
//! - Default endpoint: `https://webmention.io/api/mentions.jf2`
//!
//! ### Pagination
//! - Pages are requested one after another, starting at page 0.
//! - A page holding exactly `per-page` records means another page may follow.
//! - A shorter page (possibly empty) ends the walk.
//! - At most `max_pages` requests are made; a feed that keeps returning full
//!   pages fails with `PAGINATION_RUNAWAY`.
//!
//! ### Failure
//! - Any non-success status, transport error, timeout or undecodable body
//!   aborts the whole fetch. Partial results are never returned.

pub mod request;
pub mod response;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url, header};
use std::time::{Duration, Instant};

pub use request::{PER_PAGE, PageRequest, format_since};
pub use response::MentionFeed;
pub use self::url::{UrlError, canonicalize, resolve};

use wmcache_core::{AppConfig, Error, MentionRecord};

/// Anything that can produce the mentions received since a cursor.
///
/// The merge engine only sees this trait, so the HTTP client can be replaced
/// in tests or by another service.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// All records received after `since` (or all records when `None`),
    /// newest first.
    async fn fetch_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<MentionRecord>, Error>;
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Feed endpoint (default: webmention.io jf2 feed)
    pub endpoint: String,

    /// Domain whose mentions are requested
    pub domain: String,

    /// API token
    pub token: String,

    /// User agent string (default: "wmcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Records per page (default: 1000)
    pub per_page: usize,

    /// Maximum number of page requests per fetch (default: 50)
    pub max_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://webmention.io/api/mentions.jf2".to_string(),
            domain: String::new(),
            token: String::new(),
            user_agent: "wmcache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            per_page: PER_PAGE,
            max_pages: 50,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            domain: config.domain.clone(),
            token: config.token.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_pages: config.max_pages,
            ..Default::default()
        }
    }
}

/// HTTP client for the mentions feed.
#[derive(Debug, Clone)]
pub struct WebmentionClient {
    http: Client,
    endpoint: Url,
    config: FetchConfig,
}

impl WebmentionClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        if config.domain.is_empty() || config.token.is_empty() {
            return Err(Error::InvalidInput("domain and token are required".into()));
        }
        if config.per_page == 0 || config.max_pages == 0 {
            return Err(Error::InvalidInput("per_page and max_pages must be greater than 0".into()));
        }

        let endpoint = canonicalize(&config.endpoint).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, endpoint, config })
    }

    /// Fetch a single page of the feed.
    pub async fn fetch_page(&self, since: Option<DateTime<Utc>>, page: usize) -> Result<MentionFeed, Error> {
        let start = Instant::now();
        let query = PageRequest::new(&self.config.domain, &self.config.token, self.config.per_page, page, since);

        let response = self
            .http
            .get(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for page {}", status.as_u16(), page)));
        }

        let body: Bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let feed: MentionFeed = serde_json::from_slice(&body)
            .map_err(|e| Error::FetchUnavailable(format!("invalid feed on page {}: {}", page, e)))?;

        tracing::debug!(
            "fetched page {} ({} records, {} bytes) in {:?}",
            page,
            feed.len(),
            body.len(),
            start.elapsed()
        );

        Ok(feed)
    }

    /// Map a reqwest error without leaking the token-bearing request URL.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchUnavailable(format!("timeout after {:?}", self.config.timeout))
        } else {
            Error::FetchUnavailable(format!("network error: {}", err.without_url()))
        }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl MentionSource for WebmentionClient {
    async fn fetch_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<MentionRecord>, Error> {
        let mut mentions = Vec::new();

        for page in 0..self.config.max_pages {
            let feed = self.fetch_page(since, page).await?;
            let full = feed.len() >= self.config.per_page;
            mentions.extend(feed.children);

            if !full {
                tracing::debug!("feed exhausted after {} page(s), {} records", page + 1, mentions.len());
                return Ok(mentions);
            }
        }

        tracing::warn!(max_pages = self.config.max_pages, "feed kept returning full pages, giving up");
        Err(Error::PaginationRunaway { max_pages: self.config.max_pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED_PATH: &str = "/api/mentions.jf2";

    fn mention(id: usize) -> Value {
        json!({
            "type": "entry",
            "wm-id": id,
            "wm-target": "https://site.example/posts/a/",
            "wm-property": "like-of",
            "author": { "name": format!("author {id}") }
        })
    }

    fn page_body(ids: std::ops::Range<usize>) -> Value {
        json!({ "type": "feed", "name": "Webmentions", "children": ids.map(mention).collect::<Vec<_>>() })
    }

    fn client(server: &MockServer, per_page: usize, max_pages: usize) -> WebmentionClient {
        WebmentionClient::new(FetchConfig {
            endpoint: format!("{}{}", server.uri(), FEED_PATH),
            domain: "site.example".into(),
            token: "secret".into(),
            per_page,
            max_pages,
            ..Default::default()
        })
        .unwrap()
    }

    async fn mount_page(server: &MockServer, page: usize, body: Value) {
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn ids(records: &[MentionRecord]) -> Vec<u64> {
        records.iter().map(|r| r.extra["wm-id"].as_u64().unwrap()).collect()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.per_page, 1000);
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.timeout, Duration::from_millis(20000));
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { max_pages: 7, timeout_ms: 1500, ..AppConfig::new("site.example", "tok") };
        let config = FetchConfig::from(&app);
        assert_eq!(config.domain, "site.example");
        assert_eq!(config.token, "tok");
        assert_eq!(config.max_pages, 7);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.per_page, PER_PAGE);
    }

    #[test]
    fn test_client_requires_credentials() {
        let result = WebmentionClient::new(FetchConfig::default());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_client_rejects_bad_endpoint() {
        let config = FetchConfig {
            endpoint: "ftp://webmention.io/feed".into(),
            domain: "d".into(),
            token: "t".into(),
            ..Default::default()
        };
        assert!(matches!(WebmentionClient::new(config), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_sends_expected_query() {
        let server = MockServer::start().await;
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .and(query_param("domain", "site.example"))
            .and(query_param("token", "secret"))
            .and(query_param("per-page", "1000"))
            .and(query_param("page", "0"))
            .and(query_param("since", "2024-01-01T00:00:00.000Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..1)))
            .expect(1)
            .mount(&server)
            .await;

        let records = client(&server, PER_PAGE, 50).fetch_since(Some(since)).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_single_request() {
        let server = MockServer::start().await;
        mount_page(&server, 0, page_body(0..0)).await;

        let records = client(&server, 2, 50).fetch_since(None).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_short_first_page_terminates() {
        let server = MockServer::start().await;
        mount_page(&server, 0, page_body(0..1)).await;

        let records = client(&server, 2, 50).fetch_since(None).await.unwrap();
        assert_eq!(ids(&records), vec![0]);
    }

    #[tokio::test]
    async fn test_one_full_page_then_empty() {
        let server = MockServer::start().await;
        mount_page(&server, 0, page_body(0..2)).await;
        mount_page(&server, 1, page_body(0..0)).await;

        let records = client(&server, 2, 50).fetch_since(None).await.unwrap();
        assert_eq!(ids(&records), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_many_full_pages_concatenate_in_order() {
        let server = MockServer::start().await;
        mount_page(&server, 0, page_body(0..2)).await;
        mount_page(&server, 1, page_body(2..4)).await;
        mount_page(&server, 2, page_body(4..6)).await;
        mount_page(&server, 3, page_body(6..7)).await;

        let records = client(&server, 2, 50).fetch_since(None).await.unwrap();
        assert_eq!(ids(&records), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_runaway_feed_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..2)))
            .expect(3)
            .mount(&server)
            .await;

        let result = client(&server, 2, 3).fetch_since(None).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::PaginationRunaway { max_pages: 3 }));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_failed_page_discards_earlier_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 0, page_body(0..2)).await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, 2, 50).fetch_since(None).await.unwrap_err();
        assert!(matches!(err, Error::HttpError(_)));
        assert!(err.is_unavailable());
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FEED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server, 2, 50).fetch_since(None).await.unwrap_err();
        assert!(matches!(err, Error::FetchUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let server = MockServer::start().await;
        let endpoint = format!("{}{}", server.uri(), FEED_PATH);
        drop(server);

        let client = WebmentionClient::new(FetchConfig {
            endpoint,
            domain: "site.example".into(),
            token: "secret".into(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        let err = client.fetch_since(None).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(!err.to_string().contains("secret"));
    }
}
