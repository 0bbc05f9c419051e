//! Bill catalog: which bills exist for a year.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::{Bill, BillTitle, NewBill};
use crate::domain::providers::BillSource;
use crate::domain::repositories::BillRepository;
use crate::error::AppError;

/// Reads bills from storage, importing them from a [`BillSource`] when a year
/// has none yet.
pub struct BillCatalogService<B: BillRepository> {
    bill_repository: Arc<B>,
    source: Option<Arc<dyn BillSource>>,
}

impl<B: BillRepository> BillCatalogService<B> {
    /// Creates a catalog. Without a source, bills only come from storage.
    pub fn new(bill_repository: Arc<B>, source: Option<Arc<dyn BillSource>>) -> Self {
        Self {
            bill_repository,
            source,
        }
    }

    /// Bills to resolve for `year`, importing first if storage has none.
    ///
    /// # Errors
    ///
    /// Returns storage errors and errors from [`Self::import`].
    pub async fn bills_for_year(&self, year: i32) -> Result<Vec<BillTitle>, AppError> {
        let mut bills = self.bill_repository.list_by_year(year).await?;

        if bills.is_empty() {
            if self.source.is_some() {
                bills = self.import(year).await?;
            } else {
                warn!(year, "no bills stored and no bill source configured");
            }
        }

        Ok(bills
            .into_iter()
            .map(|bill| BillTitle::new(bill.year, bill.title))
            .collect())
    }

    /// Fetches all bills proposed in `year` from the source and stores them.
    ///
    /// Bills already stored are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] without a source, otherwise the
    /// source's error or a storage error.
    pub async fn import(&self, year: i32) -> Result<Vec<Bill>, AppError> {
        let Some(source) = &self.source else {
            return Err(AppError::configuration(
                "No bill source configured",
                serde_json::json!({ "year": year }),
            ));
        };

        let sourced = source.bills_for_year(year).await?;
        let before = self.bill_repository.count(Some(year)).await?;

        let mut bills = Vec::with_capacity(sourced.len());
        for bill in sourced {
            let new_bill = NewBill::new(year, &bill.title, bill.propose_date);
            if new_bill.title.is_empty() {
                continue;
            }
            bills.push(self.bill_repository.upsert(new_bill).await?);
        }

        let after = self.bill_repository.count(Some(year)).await?;
        info!(year, fetched = bills.len(), inserted = after - before, "bill catalog imported");
        Ok(bills)
    }

    /// Stores a single bill typed in by an operator.
    pub async fn add(&self, year: i32, title: &str) -> Result<Bill, AppError> {
        let new_bill = NewBill::new(year, title, None);
        if new_bill.title.is_empty() {
            return Err(AppError::configuration(
                "Bill title is empty",
                serde_json::json!({ "year": year }),
            ));
        }
        self.bill_repository.upsert(new_bill).await
    }
}
