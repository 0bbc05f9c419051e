//! Contracts of the external collaborators the pipeline consumes.
//!
//! Concrete adapters live in `crate::infrastructure::clients`. Every method
//! may fail with [`AppError::TransientFetch`]; the services decide what a
//! failure means for the bill being resolved.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;

/// One raw result of a news search, before any cleanup or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub published_at: String,
}

/// Full-text news search.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns at most `limit` hits for `query`, newest first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError>;
}

/// Text embedding. Deterministic for a given text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// What a scraping session observed on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSnapshot {
    /// Reaction elements currently rendered.
    pub reaction_count: u32,
    /// Whether a "show more" control is still present.
    pub reveal_available: bool,
}

/// Factory of isolated scraping sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScrapingBackend: Send + Sync {
    /// Opens a session owned exclusively by the caller.
    async fn open_session(&self) -> Result<Box<dyn ScrapingSession>, AppError>;
}

/// A single browser context. Not safe to share between concurrent probes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScrapingSession: Send {
    /// Navigates to `url` and reports the initial page state.
    async fn load(&mut self, url: &str) -> Result<PageSnapshot, AppError>;

    /// Activates the reveal control once and reports the resulting state.
    async fn reveal_more(&mut self) -> Result<PageSnapshot, AppError>;

    /// Releases the session. Must be called exactly once, even after failures.
    async fn close(&mut self);
}

/// A bill as listed by the legislative source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedBill {
    pub title: String,
    pub propose_date: Option<NaiveDate>,
}

/// Source of bill titles for a year.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillSource: Send + Sync {
    async fn bills_for_year(&self, year: i32) -> Result<Vec<SourcedBill>, AppError>;
}

/// Fetches the readable text of a news article.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleBodySource: Send + Sync {
    async fn fetch_body(&self, url: &str) -> Result<String, AppError>;
}
