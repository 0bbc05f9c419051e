//! Search query derivation and raw candidate retrieval.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{Candidate, parse_published_at};
use crate::domain::providers::{SearchHit, SearchProvider};
use crate::error::AppError;
use crate::utils::query_builder::build_search_query;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("markup pattern is valid"));

/// Strips highlight markup (`<b>`..`</b>`) and common HTML entities from a provider title.
pub fn clean_hit_title(raw: &str) -> String {
    let without_tags = MARKUP.replace_all(raw, "");
    without_tags
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn to_candidate(hit: SearchHit) -> Candidate {
    let published_at = parse_published_at(&hit.published_at);
    if published_at.is_none() {
        debug!(url = %hit.url, raw = %hit.published_at, "unparseable publish timestamp");
    }
    Candidate::new(clean_hit_title(&hit.title), hit.url.trim().to_string(), published_at)
}

/// Issues one search per bill and returns its raw candidates, newest first.
pub struct CandidateFetcher {
    provider: Arc<dyn SearchProvider>,
    page_size: usize,
}

impl CandidateFetcher {
    pub fn new(provider: Arc<dyn SearchProvider>, page_size: usize) -> Self {
        Self {
            provider,
            page_size,
        }
    }

    /// Searches for articles about `bill_title`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransientFetch`] on any provider failure. The caller
    /// treats the bill as unresolved for this run.
    pub async fn fetch(&self, bill_title: &str) -> Result<Vec<Candidate>, AppError> {
        let query = build_search_query(bill_title);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .provider
            .search(&query, self.page_size)
            .await
            .map_err(|e| {
                warn!(query = %query, error = %e, "candidate search failed");
                match e {
                    AppError::TransientFetch { .. } => e,
                    other => AppError::transient(
                        "Candidate search failed",
                        json!({ "query": query, "reason": other.to_string() }),
                    ),
                }
            })?;

        debug!(query = %query, hits = hits.len(), "candidates fetched");

        Ok(hits
            .into_iter()
            .take(self.page_size)
            .map(to_candidate)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::providers::MockSearchProvider;

    fn hit(title: &str, url: &str, date: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: url.to_string(),
            published_at: date.to_string(),
        }
    }

    #[test]
    fn test_clean_hit_title() {
        assert_eq!(
            clean_hit_title("<b>청소년 보호법</b> &quot;개정&quot; 통과"),
            "청소년 보호법 \"개정\" 통과"
        );
        assert_eq!(clean_hit_title("A &amp; B"), "A & B");
        assert_eq!(clean_hit_title("plain"), "plain");
    }

    #[tokio::test]
    async fn test_fetch_cleans_query_and_hits() {
        let mut provider = MockSearchProvider::new();
        provider
            .expect_search()
            .withf(|query, limit| query == "청소년 보호법" && *limit == 100)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    hit(
                        "<b>청소년 보호법</b> 개정",
                        " https://n.news.naver.com/article/001/1 ",
                        "Tue, 14 Jan 2025 09:30:00 +0900",
                    ),
                    hit("no date", "https://n.news.naver.com/article/001/2", "??"),
                ])
            });

        let fetcher = CandidateFetcher::new(Arc::new(provider), 100);
        let candidates = fetcher
            .fetch("청소년 보호법 일부개정법률안(홍길동의원 등 10인)")
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "청소년 보호법 개정");
        assert_eq!(candidates[0].url, "https://n.news.naver.com/article/001/1");
        assert!(candidates[0].published_at.is_some());
        assert!(candidates[1].published_at.is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_is_transient() {
        let mut provider = MockSearchProvider::new();
        provider
            .expect_search()
            .returning(|_, _| Err(AppError::internal("boom", json!({}))));

        let fetcher = CandidateFetcher::new(Arc::new(provider), 10);
        let err = fetcher.fetch("Aviation Safety Act").await.unwrap_err();
        assert_eq!(err.code(), "transient_fetch");
    }

    #[tokio::test]
    async fn test_empty_search_is_ok() {
        let mut provider = MockSearchProvider::new();
        provider.expect_search().returning(|_, _| Ok(vec![]));

        let fetcher = CandidateFetcher::new(Arc::new(provider), 10);
        assert!(fetcher.fetch("Aviation Safety Act").await.unwrap().is_empty());
    }
}
