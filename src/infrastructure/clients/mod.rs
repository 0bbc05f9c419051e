//! HTTP adapters for the external collaborators.
//!
//! Each client implements one trait from [`crate::domain::providers`] and
//! reports failures as [`ClientError`], which converts into
//! [`AppError::TransientFetch`].
//!
//! - [`NaverNewsClient`] - News search
//! - [`EmbeddingApiClient`] - OpenAI-compatible `/v1/embeddings`
//! - [`BrowserlessBackend`] - Comment counting through a Browserless `/function` endpoint
//! - [`AssemblyBillClient`] - National Assembly bill listing
//! - [`HttpArticleBodySource`] - Article text extraction

pub mod article_body;
pub mod assembly_bills;
pub mod browserless;
pub mod embedding_api;
pub mod naver_news;

pub use article_body::{HttpArticleBodySource, extract_article_text};
pub use assembly_bills::AssemblyBillClient;
pub use browserless::{BrowserlessBackend, count_reactions};
pub use embedding_api::EmbeddingApiClient;
pub use naver_news::NaverNewsClient;

use serde_json::json;
use std::time::Duration;

use crate::error::AppError;

/// Default per-request timeout of the HTTP clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = "Mozilla/5.0 (compatible; bill-news-resolver/0.1)";

/// Errors from the HTTP adapters.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Client initialization failed: {0}")]
    Init(String),
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        let details = match &e {
            ClientError::Status { code, .. } => json!({ "status": code }),
            _ => json!({}),
        };
        AppError::transient(e.to_string(), details)
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ClientError::Init(e.to_string()))
}

/// Turns a non-2xx response into [`ClientError::Status`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    Err(ClientError::Status {
        code: status.as_u16(),
        body: truncate(&body, 300).to_string(),
    })
}

/// Truncates a string to at most `max_len` bytes on a char boundary.
pub(crate) fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_becomes_transient() {
        let err: AppError = ClientError::Status {
            code: 503,
            body: "busy".into(),
        }
        .into();
        assert_eq!(err.code(), "transient_fetch");
        assert_eq!(err.details()["status"], 503);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("법안abc", 4), "법");
        assert_eq!(truncate("short", 10), "short");
    }
}
