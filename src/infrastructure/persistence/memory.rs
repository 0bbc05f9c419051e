//! In-memory repositories with the same uniqueness semantics as PostgreSQL.
//!
//! Used by `--dry-run` and by the pipeline tests. State lives behind a
//! `tokio::sync::Mutex` that is only held for the duration of one map operation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::{Bill, InsertOutcome, NewBill, NewNewsLink, NewsLink};
use crate::domain::repositories::{BillRepository, LinkCounts, LinkRepository};
use crate::error::AppError;

#[derive(Default)]
struct BillTable {
    next_id: i64,
    rows: Vec<Bill>,
    by_key: HashMap<(i32, String), usize>,
}

/// Bill catalog kept in process memory.
#[derive(Default, Clone)]
pub struct InMemoryBillRepository {
    table: Arc<Mutex<BillTable>>,
}

impl InMemoryBillRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a bill by id, for joins done by [`InMemoryLinkRepository`].
    async fn by_id(&self, id: i64) -> Option<Bill> {
        let table = self.table.lock().await;
        table.rows.iter().find(|b| b.id == id).cloned()
    }
}

#[async_trait]
impl BillRepository for InMemoryBillRepository {
    async fn upsert(&self, new_bill: NewBill) -> Result<Bill, AppError> {
        let mut table = self.table.lock().await;
        let key = (new_bill.year, new_bill.title.clone());
        if let Some(&idx) = table.by_key.get(&key) {
            return Ok(table.rows[idx].clone());
        }

        table.next_id += 1;
        let bill = Bill::new(
            table.next_id,
            new_bill.year,
            new_bill.title,
            new_bill.propose_date,
            Utc::now(),
        );
        let idx = table.rows.len();
        table.rows.push(bill.clone());
        table.by_key.insert(key, idx);
        Ok(bill)
    }

    async fn find(&self, year: i32, title: &str) -> Result<Option<Bill>, AppError> {
        let table = self.table.lock().await;
        Ok(table
            .by_key
            .get(&(year, title.to_string()))
            .map(|&idx| table.rows[idx].clone()))
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<Bill>, AppError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().filter(|b| b.year == year).cloned().collect())
    }

    async fn count(&self, year: Option<i32>) -> Result<i64, AppError> {
        let table = self.table.lock().await;
        let n = table
            .rows
            .iter()
            .filter(|b| year.is_none_or(|y| b.year == y))
            .count();
        Ok(n as i64)
    }
}

#[derive(Default)]
struct LinkTable {
    next_id: i64,
    rows: Vec<NewsLink>,
}

/// Resolution results kept in process memory, unique on `(bill_id, news_url)`.
#[derive(Clone)]
pub struct InMemoryLinkRepository {
    table: Arc<Mutex<LinkTable>>,
    bills: InMemoryBillRepository,
}

impl InMemoryLinkRepository {
    /// `bills` resolves the bill side of [`LinkRepository::list_by_year`].
    pub fn new(bills: InMemoryBillRepository) -> Self {
        Self {
            table: Arc::new(Mutex::new(LinkTable::default())),
            bills,
        }
    }

    /// Total number of stored records.
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every stored record, in insertion order.
    pub async fn all(&self) -> Vec<NewsLink> {
        self.table.lock().await.rows.clone()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn exists(&self, bill_id: i64, news_url: &str) -> Result<bool, AppError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .any(|l| l.bill_id == bill_id && l.news_url == news_url))
    }

    async fn insert(&self, new_link: NewNewsLink) -> Result<InsertOutcome, AppError> {
        let mut table = self.table.lock().await;
        let taken = table
            .rows
            .iter()
            .any(|l| l.bill_id == new_link.bill_id && l.news_url == new_link.news_url);
        if taken {
            return Ok(InsertOutcome::AlreadyExists);
        }

        table.next_id += 1;
        let link = NewsLink::new(
            table.next_id,
            new_link.bill_id,
            new_link.news_title,
            new_link.news_url,
            new_link.comment_count,
            new_link.similarity,
            None,
            Utc::now(),
        );
        table.rows.push(link.clone());
        Ok(InsertOutcome::Inserted(link))
    }

    async fn get_existing(&self, bill_id: i64) -> Result<Option<NewsLink>, AppError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|l| l.bill_id == bill_id).cloned())
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<(Bill, NewsLink)>, AppError> {
        let links = self.all().await;
        let mut out = Vec::new();
        for link in links {
            if let Some(bill) = self.bills.by_id(link.bill_id).await
                && bill.year == year
            {
                out.push((bill, link));
            }
        }
        out.sort_by_key(|(bill, link)| (bill.id, link.id));
        Ok(out)
    }

    async fn list_missing_body(&self, limit: i64) -> Result<Vec<NewsLink>, AppError> {
        let table = self.table.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(table
            .rows
            .iter()
            .filter(|l| l.body.is_none() && !l.is_no_match())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_body(&self, id: i64, body: &str) -> Result<(), AppError> {
        let mut table = self.table.lock().await;
        match table.rows.iter_mut().find(|l| l.id == id) {
            Some(link) => {
                link.body = Some(body.to_string());
                Ok(())
            }
            None => Err(AppError::not_found(
                "News link not found",
                json!({ "id": id }),
            )),
        }
    }

    async fn counts(&self) -> Result<LinkCounts, AppError> {
        let table = self.table.lock().await;
        let mut counts = LinkCounts::default();
        for link in &table.rows {
            if link.is_no_match() {
                counts.no_match += 1;
            } else {
                counts.matched += 1;
            }
            if link.body.is_some() {
                counts.with_body += 1;
            }
        }
        Ok(counts)
    }
}
