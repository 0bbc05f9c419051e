//! Naver news search API client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{ClientError, build_http_client, ensure_success};
use crate::domain::providers::{SearchHit, SearchProvider};
use crate::error::AppError;

/// Largest page the search API serves.
pub const MAX_DISPLAY: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
}

/// News search over `GET {base_url}?query=..&display=..&start=1&sort=date`.
///
/// Results come back newest first. Titles keep the provider's `<b>`
/// highlighting; cleanup happens in the candidate fetcher.
pub struct NaverNewsClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for NaverNewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaverNewsClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl NaverNewsClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    pub async fn search_news(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ClientError> {
        let display = limit.clamp(1, MAX_DISPLAY).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", query),
                ("display", display.as_str()),
                ("start", "1"),
                ("sort", "date"),
            ])
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .send()
            .await?;

        let body: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("search response: {e}")))?;

        debug!(query, hits = body.items.len(), "news search completed");

        Ok(body
            .items
            .into_iter()
            .take(limit)
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
                published_at: item.pub_date,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for NaverNewsClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        Ok(self.search_news(query, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NaverNewsClient {
        NaverNewsClient::new(
            &format!("{}/v1/search/news.json", server.uri()),
            "id-123",
            "secret-456",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_credentials_and_parses_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search/news.json"))
            .and(query_param("query", "청소년 보호법"))
            .and(query_param("display", "100"))
            .and(query_param("sort", "date"))
            .and(header("X-Naver-Client-Id", "id-123"))
            .and(header("X-Naver-Client-Secret", "secret-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lastBuildDate": "Tue, 14 Jan 2025 10:00:00 +0900",
                "total": 2,
                "items": [
                    {
                        "title": "<b>청소년 보호법</b> 개정 논의",
                        "originallink": "https://press.example.com/a/1",
                        "link": "https://n.news.naver.com/mnews/article/001/0001?sid=100",
                        "description": "...",
                        "pubDate": "Tue, 14 Jan 2025 09:30:00 +0900"
                    },
                    {
                        "title": "다른 기사",
                        "originallink": "https://press.example.com/a/2",
                        "link": "https://press.example.com/a/2",
                        "description": "...",
                        "pubDate": "Mon, 13 Jan 2025 09:30:00 +0900"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let hits = client(&server).search_news("청소년 보호법", 100).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "<b>청소년 보호법</b> 개정 논의");
        assert_eq!(
            hits[0].url,
            "https://n.news.naver.com/mnews/article/001/0001?sid=100"
        );
        assert_eq!(hits[0].published_at, "Tue, 14 Jan 2025 09:30:00 +0900");
    }

    #[tokio::test]
    async fn test_search_truncates_to_limit() {
        let server = MockServer::start().await;

        let items: Vec<_> = (0..5)
            .map(|i| {
                serde_json::json!({
                    "title": format!("t{i}"),
                    "link": format!("https://n.news.naver.com/article/001/{i}"),
                    "pubDate": "Tue, 14 Jan 2025 09:30:00 +0900"
                })
            })
            .collect();

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": items })),
            )
            .mount(&server)
            .await;

        let hits = client(&server).search_news("q", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_error_status_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server).search("q", 10).await.unwrap_err();
        assert_eq!(err.code(), "transient_fetch");
        assert_eq!(err.details()["status"], 429);
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).search_news("q", 10).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
