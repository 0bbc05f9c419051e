//! Repository trait for bill→news link data access.

use crate::domain::entities::{Bill, InsertOutcome, NewNewsLink, NewsLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Aggregate counts over persisted links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub matched: i64,
    pub no_match: i64,
    pub with_body: i64,
}

/// Repository interface for persisted resolution results.
///
/// The store's `(bill_id, news_url)` uniqueness constraint is the arbiter of
/// duplicate writes: [`LinkRepository::insert`] never overwrites.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - dry runs and tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Returns true if a record exists for `(bill_id, news_url)`.
    async fn exists(&self, bill_id: i64, news_url: &str) -> Result<bool, AppError>;

    /// Inserts the record if absent.
    ///
    /// # Returns
    ///
    /// - `Ok(InsertOutcome::Inserted(link))` when this call created the row
    /// - `Ok(InsertOutcome::AlreadyExists)` when the key was already taken
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_link: NewNewsLink) -> Result<InsertOutcome, AppError>;

    /// Returns the first record stored for a bill (a Match or the NoMatch sentinel).
    async fn get_existing(&self, bill_id: i64) -> Result<Option<NewsLink>, AppError>;

    /// Lists every record of one year together with its bill, in bill order.
    async fn list_by_year(&self, year: i32) -> Result<Vec<(Bill, NewsLink)>, AppError>;

    /// Matched records whose article body has not been collected yet.
    async fn list_missing_body(&self, limit: i64) -> Result<Vec<NewsLink>, AppError>;

    /// Stores the article body of a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist.
    async fn update_body(&self, id: i64, body: &str) -> Result<(), AppError>;

    async fn counts(&self) -> Result<LinkCounts, AppError>;
}
