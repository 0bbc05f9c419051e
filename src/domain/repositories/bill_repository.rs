//! Repository trait for bill data access.

use crate::domain::entities::{Bill, NewBill};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for legislative bills.
///
/// Bills are keyed by `(year, normalized title)`. Callers pass titles through
/// [`NewBill::new`] or [`crate::utils::title_normalizer::normalize_title`]
/// before every lookup.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgBillRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryBillRepository`] - dry runs and tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Inserts the bill if absent and returns the stored row either way.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn upsert(&self, new_bill: NewBill) -> Result<Bill, AppError>;

    /// Finds a bill by year and normalized title.
    async fn find(&self, year: i32, title: &str) -> Result<Option<Bill>, AppError>;

    /// Lists the bills of one year in insertion order.
    async fn list_by_year(&self, year: i32) -> Result<Vec<Bill>, AppError>;

    /// Counts bills, optionally for one year.
    async fn count(&self, year: Option<i32>) -> Result<i64, AppError>;
}
