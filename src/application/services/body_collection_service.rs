//! Article body collection for matched links.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::providers::ArticleBodySource;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyCollectionReport {
    pub stored: usize,
    pub failed: usize,
}

/// Fills in `body` for matched links that do not have one yet.
pub struct BodyCollectionService<L: LinkRepository> {
    link_repository: Arc<L>,
    source: Arc<dyn ArticleBodySource>,
}

impl<L: LinkRepository> BodyCollectionService<L> {
    pub fn new(link_repository: Arc<L>, source: Arc<dyn ArticleBodySource>) -> Self {
        Self {
            link_repository,
            source,
        }
    }

    /// Fetches and stores up to `limit` missing bodies, oldest links first.
    ///
    /// A failing article is logged and skipped; it stays without a body and
    /// is picked up again on the next run.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pending links cannot be listed.
    pub async fn collect(&self, limit: i64) -> Result<BodyCollectionReport, AppError> {
        let mut report = BodyCollectionReport::default();
        if limit <= 0 {
            return Ok(report);
        }

        let pending = self.link_repository.list_missing_body(limit).await?;
        debug!(pending = pending.len(), "collecting article bodies");

        for link in pending {
            let body = match self.source.fetch_body(&link.news_url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(link_id = link.id, url = %link.news_url, error = %e, "article body unavailable");
                    report.failed += 1;
                    continue;
                }
            };

            match self.link_repository.update_body(link.id, &body).await {
                Ok(()) => report.stored += 1,
                Err(e) => {
                    warn!(link_id = link.id, error = %e, "article body not stored");
                    report.failed += 1;
                }
            }
        }

        info!(stored = report.stored, failed = report.failed, "article bodies collected");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewBill, NewNewsLink};
    use crate::domain::providers::MockArticleBodySource;
    use crate::domain::repositories::{BillRepository, MockLinkRepository};
    use crate::infrastructure::persistence::{InMemoryBillRepository, InMemoryLinkRepository};
    use serde_json::json;

    async fn seeded() -> Arc<InMemoryLinkRepository> {
        let bills = InMemoryBillRepository::new();
        let bill = bills
            .upsert(NewBill::new(2025, "Aviation Safety Act", None))
            .await
            .unwrap();
        let links = InMemoryLinkRepository::new(bills);
        let urls = [
            "https://n.news.naver.com/article/001/1",
            "https://n.news.naver.com/article/001/2",
        ];
        for (n, url) in urls.into_iter().enumerate() {
            links
                .insert(NewNewsLink {
                    bill_id: bill.id,
                    news_title: format!("article {n}"),
                    news_url: url.to_string(),
                    comment_count: 10,
                    similarity: 0.7,
                })
                .await
                .unwrap();
        }
        Arc::new(links)
    }

    #[tokio::test]
    async fn test_failed_article_is_skipped() {
        let links = seeded().await;
        let mut source = MockArticleBodySource::new();
        source.expect_fetch_body().returning(|url| {
            if url.ends_with("/1") {
                Ok("First paragraph.\n\nSecond paragraph.".to_string())
            } else {
                Err(AppError::transient("404", json!({})))
            }
        });

        let service = BodyCollectionService::new(Arc::clone(&links), Arc::new(source));
        let report = service.collect(10).await.unwrap();

        assert_eq!(report, BodyCollectionReport { stored: 1, failed: 1 });
        let pending = links.list_missing_body(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].news_url, "https://n.news.naver.com/article/001/2");
    }

    #[tokio::test]
    async fn test_zero_limit_does_nothing() {
        let mut repo = MockLinkRepository::new();
        repo.expect_list_missing_body().never();
        let mut source = MockArticleBodySource::new();
        source.expect_fetch_body().never();

        let service = BodyCollectionService::new(Arc::new(repo), Arc::new(source));
        assert_eq!(service.collect(0).await.unwrap(), BodyCollectionReport::default());
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_list_missing_body()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let service =
            BodyCollectionService::new(Arc::new(repo), Arc::new(MockArticleBodySource::new()));
        assert!(service.collect(5).await.is_err());
    }
}
