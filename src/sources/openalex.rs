//! OpenAlex works source.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::sources::{SourceError, WorksSource};
use crate::utils::{default_user_agent, HttpClient};

pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Page size requested per batch. Larger than any batch, so duplicate
/// upstream records for one DOI cannot push other matches off the page.
const PER_PAGE: usize = 200;

/// OpenAlex research source
///
/// Uses the `/works` endpoint with a `doi:` OR filter.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: Url,
    email: Option<String>,
}

impl OpenAlexSource {
    /// Create a source against the public API
    pub fn new(email: Option<String>, timeout: Duration) -> Result<Self, SourceError> {
        Self::with_base_url(OPENALEX_API_BASE, email, timeout)
    }

    /// Create a source against a custom base URL (mirrors, tests)
    pub fn with_base_url(
        base_url: &str,
        email: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let email = email.filter(|e| !e.trim().is_empty());
        let client = HttpClient::builder()
            .user_agent(default_user_agent(email.as_deref()))
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, base_url, email)
    }

    /// Create a source from an existing HTTP client
    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        email: Option<String>,
    ) -> Result<Self, SourceError> {
        // A trailing slash makes `join` append instead of replacing the last segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid base URL {}: {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            email,
        })
    }

    /// Contact address sent with each request
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Build the OR filter for a batch: `doi:a|b|c`
    pub fn doi_filter(dois: &[String]) -> String {
        format!("doi:{}", dois.join("|"))
    }

    /// Whether an identifier can be placed in a `doi:` filter.
    ///
    /// `,` separates filters and `|` separates OR values, so an identifier
    /// holding either would corrupt the filter for its whole batch.
    pub fn is_filter_safe(doi: &str) -> bool {
        !doi.contains([',', '|'])
    }

    /// Build the request URL for a batch
    pub fn build_url(&self, dois: &[String]) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join("works")
            .map_err(|e| SourceError::InvalidRequest(e.to_string()))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("filter", &Self::doi_filter(dois));
            query.append_pair("per-page", &PER_PAGE.to_string());
            // Polite pool
            query.append_pair("mailto", self.email.as_deref().unwrap_or_default());
        }

        Ok(url)
    }
}

#[async_trait]
impl WorksSource for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    async fn works_by_dois(&self, dois: &[String]) -> Result<Vec<Value>, SourceError> {
        let (safe, unsafe_dois): (Vec<String>, Vec<String>) =
            dois.iter().cloned().partition(|d| Self::is_filter_safe(d));
        for doi in &unsafe_dois {
            tracing::debug!(doi = %doi, "Not sent upstream, identifier contains a filter separator");
        }
        if safe.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.build_url(&safe)?;
        tracing::debug!(url = %url, dois = safe.len(), "Querying OpenAlex");

        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to query OpenAlex: {}", e)))?;

        if response.status() != StatusCode::OK {
            return Err(SourceError::Api(format!(
                "OpenAlex API returned status: {}",
                response.status()
            )));
        }

        let data: WorksResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        tracing::debug!(
            requested = safe.len(),
            returned = data.results.len(),
            total = ?data.meta.as_ref().map(|m| m.count),
            "OpenAlex batch complete"
        );

        Ok(data.results)
    }
}

// ===== OpenAlex API Types =====

/// Works are kept as raw JSON; only the envelope is typed
#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn dois(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn source(base: &str) -> OpenAlexSource {
        OpenAlexSource::with_base_url(
            base,
            Some("team@example.org".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_doi_filter() {
        assert_eq!(
            OpenAlexSource::doi_filter(&dois(&["10.1/a", "10.1/b"])),
            "doi:10.1/a|10.1/b"
        );
    }

    #[test]
    fn test_build_url() {
        let src = source("https://api.openalex.org");
        let url = src.build_url(&dois(&["10.1/a", "10.1/b"])).unwrap();

        assert_eq!(url.path(), "/works");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("filter".to_string(), "doi:10.1/a|10.1/b".to_string())));
        assert!(pairs.contains(&("mailto".to_string(), "team@example.org".to_string())));
        assert!(pairs.contains(&("per-page".to_string(), "200".to_string())));
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let src = source("http://localhost:1234/mirror/");
        let url = src.build_url(&dois(&["10.1/a"])).unwrap();
        assert_eq!(url.path(), "/mirror/works");
    }

    #[test]
    fn test_blank_email_is_dropped() {
        let src = OpenAlexSource::new(Some("  ".to_string()), Duration::from_secs(5)).unwrap();
        assert_eq!(src.email(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = OpenAlexSource::with_base_url("not a url", None, Duration::from_secs(5));
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_works_by_dois_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                "doi:10.1136/bmjgh-2023-013696".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "meta": {"count": 1},
                    "results": [{
                        "id": "https://openalex.org/W1",
                        "doi": "https://doi.org/10.1136/bmjgh-2023-013696"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let src = source(&server.url());
        let works = src
            .works_by_dois(&dois(&["10.1136/bmjgh-2023-013696"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(works.len(), 1);
        assert_eq!(works[0]["id"], "https://openalex.org/W1");
    }

    #[tokio::test]
    async fn test_works_by_dois_missing_results_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let works = source(&server.url())
            .works_by_dois(&dois(&["10.1/a"]))
            .await
            .unwrap();
        assert!(works.is_empty());
    }

    #[tokio::test]
    async fn test_works_by_dois_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let result = source(&server.url()).works_by_dois(&dois(&["10.1/a"])).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    #[tokio::test]
    async fn test_works_by_dois_bad_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let result = source(&server.url()).works_by_dois(&dois(&["10.1/a"])).await;
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_is_filter_safe() {
        assert!(OpenAlexSource::is_filter_safe("10.1136/bmjgh-2023-013696"));
        assert!(!OpenAlexSource::is_filter_safe("10.1/x, 10.1/y"));
        assert!(!OpenAlexSource::is_filter_safe("10.1/x|10.1/y"));
    }

    #[tokio::test]
    async fn test_separator_dois_are_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                "doi:10.1/good|10.1/other".into(),
            ))
            .with_status(200)
            .with_body(
                json!({"results": [
                    {"id": "https://openalex.org/W1", "doi": "https://doi.org/10.1/good"},
                    {"id": "https://openalex.org/W2", "doi": "https://doi.org/10.1/other"}
                ]})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let works = source(&server.url())
            .works_by_dois(&dois(&["10.1/good", "10.1/x, 10.1/y", "10.1/other"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(works.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_of_only_separator_dois_skips_request() {
        let src = source("http://127.0.0.1:9");
        let works = src
            .works_by_dois(&dois(&["10.1/x, 10.1/y", "10.1/a|10.1/b"]))
            .await
            .unwrap();
        assert!(works.is_empty());
    }

    #[tokio::test]
    async fn test_non_200_success_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let result = source(&server.url()).works_by_dois(&dois(&["10.1/a"])).await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }

    /// Accepts connections and never answers
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let base = silent_server().await;
        let src = OpenAlexSource::with_base_url(&base, None, Duration::from_secs(1)).unwrap();

        let result = src.works_by_dois(&dois(&["10.1/a"])).await;
        assert!(matches!(result, Err(SourceError::Network(_))));
    }

    #[tokio::test]
    async fn test_timed_out_batch_is_reported_failed() {
        use crate::pipeline::{FetchOptions, Pipeline, RunRequest};
        use std::sync::Arc;

        let base = silent_server().await;
        let src = OpenAlexSource::with_base_url(&base, None, Duration::from_secs(1)).unwrap();
        let report = Pipeline::new(Arc::new(src), FetchOptions::default())
            .run(&RunRequest::new(["10.1/a", "10.1/b"]))
            .await
            .unwrap();

        assert_eq!(report.total_batches, 1);
        assert_eq!(report.failed_batches.len(), 1);
        assert!(report.failed_batches[0].reason.starts_with("Network error"));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.matched(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Nothing listens on this address; an empty batch must not touch it
        let src = source("http://127.0.0.1:9");
        assert!(src.works_by_dois(&[]).await.unwrap().is_empty());
    }
}
