//! Remote page fetcher for the Scopus search API

use super::query::SortBy;
use crate::config::ScopusConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Longest slice of an upstream error body kept in error messages
const ERROR_BODY_LIMIT: usize = 300;

/// One page of raw results
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// Raw entries in upstream order
    pub entries: Vec<Value>,
    /// Upstream's reported total match count (0 when absent or unparsable)
    pub total_available: u64,
}

/// Source of result pages. One call is one upstream request.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch up to `count` entries starting at offset `start`
    async fn fetch_page(&self, query: &str, count: u32, start: u64, sort: SortBy) -> Result<RawPage>;

    /// Largest page the source serves
    fn max_per_page(&self) -> u32;
}

/// Build the shared outbound HTTP client
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Scopus client bound to one user's API key
pub struct ScopusClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_per_page: u32,
}

impl ScopusClient {
    pub fn new(client: reqwest::Client, api_key: String, config: &ScopusConfig) -> Self {
        Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
            max_per_page: config.max_results_per_page.max(1),
        }
    }

    async fn request(&self, query: &str, count: u32, start: u64, sort: SortBy) -> Result<RawPage> {
        let count = count.min(self.max_per_page);

        let response = self
            .client
            .get(&self.base_url)
            .header("X-ELS-APIKey", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("query", query.to_string()),
                ("count", count.to_string()),
                ("start", start.to_string()),
                ("sort", sort.token().to_string()),
                ("view", "STANDARD".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteService {
                status: status.as_u16(),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let body: Value = response.json().await.map_err(|e| AppError::RemoteService {
            status: status.as_u16(),
            message: format!("Invalid response body: {}", e),
        })?;

        Ok(parse_page(&body))
    }
}

#[async_trait]
impl PageFetcher for ScopusClient {
    async fn fetch_page(&self, query: &str, count: u32, start: u64, sort: SortBy) -> Result<RawPage> {
        let started = Instant::now();
        let result = self.request(query, count, start, sort).await;
        let elapsed = started.elapsed();

        metrics::record_remote_call(elapsed.as_secs_f64(), result.is_ok());
        match &result {
            Ok(page) => tracing::debug!(
                start,
                count,
                received = page.entries.len(),
                total = page.total_available,
                elapsed_ms = elapsed.as_millis() as u64,
                "Fetched Scopus page"
            ),
            Err(e) => tracing::warn!(start, count, error = %e, "Scopus page request failed"),
        }
        result
    }

    fn max_per_page(&self) -> u32 {
        self.max_per_page
    }
}

/// Pull entries and the total count out of a response body
pub fn parse_page(body: &Value) -> RawPage {
    let results = match body.get("search-results") {
        Some(results) => results,
        None => return RawPage::default(),
    };

    let total_available = match results.get("opensearch:totalResults") {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    };

    let entries = results
        .get("entry")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    RawPage {
        entries,
        total_available,
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard, per_page: u32) -> ScopusClient {
        let config = ScopusConfig {
            base_url: format!("{}/content/search/scopus", server.url()),
            max_results_per_page: per_page,
            ..ScopusConfig::default()
        };
        let http = build_http_client(Duration::from_secs(5)).unwrap();
        ScopusClient::new(http, "test-key".to_string(), &config)
    }

    #[test]
    fn test_parse_page_string_total() {
        let page = parse_page(&json!({
            "search-results": {
                "opensearch:totalResults": "1234",
                "entry": [{"eid": "a"}, {"eid": "b"}]
            }
        }));
        assert_eq!(page.total_available, 1234);
        assert_eq!(page.entries.len(), 2);
    }

    #[test]
    fn test_parse_page_defaults() {
        let page = parse_page(&json!({"search-results": {"opensearch:totalResults": "lots"}}));
        assert_eq!(page.total_available, 0);
        assert!(page.entries.is_empty());

        let page = parse_page(&json!({"something-else": {}}));
        assert_eq!(page.total_available, 0);
        assert!(page.entries.is_empty());

        let page = parse_page(&json!({"search-results": {"opensearch:totalResults": 7}}));
        assert_eq!(page.total_available, 7);
    }

    #[tokio::test]
    async fn test_request_wire_contract() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/content/search/scopus")
            .match_header("x-els-apikey", "test-key")
            .match_header("accept", "application/json")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("query".into(), "deep learning AND DOCTYPE(ar)".into()),
                mockito::Matcher::UrlEncoded("count".into(), "25".into()),
                mockito::Matcher::UrlEncoded("start".into(), "50".into()),
                mockito::Matcher::UrlEncoded("sort".into(), "-citedby-count".into()),
                mockito::Matcher::UrlEncoded("view".into(), "STANDARD".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "search-results": {
                        "opensearch:totalResults": "3",
                        "entry": [{"eid": "2-s2.0-1"}]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, 25);
        // count above the page maximum is clamped
        let page = client
            .fetch_page("deep learning AND DOCTYPE(ar)", 100, 50, SortBy::Citations)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.total_available, 3);
        assert_eq!(page.entries[0]["eid"], "2-s2.0-1");
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/content/search/scopus")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body("{\"service-error\":{\"status\":{\"statusText\":\"Invalid API Key\"}}}")
            .create_async()
            .await;

        let client = client_for(&server, 25);
        let err = client
            .fetch_page("x", 10, 0, SortBy::Relevance)
            .await
            .unwrap_err();

        match err {
            AppError::RemoteService { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API Key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_remote_error() {
        let config = ScopusConfig {
            base_url: "http://127.0.0.1:1/content/search/scopus".to_string(),
            ..ScopusConfig::default()
        };
        let http = build_http_client(Duration::from_secs(2)).unwrap();
        let client = ScopusClient::new(http, "k".to_string(), &config);

        let err = client.fetch_page("x", 10, 0, SortBy::Relevance).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteService { .. }));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
