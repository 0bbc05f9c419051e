//! PostgreSQL implementation of bill repository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::entities::{Bill, NewBill};
use crate::domain::repositories::BillRepository;
use crate::error::AppError;

/// PostgreSQL repository for the bill catalog.
pub struct PgBillRepository {
    pool: Arc<PgPool>,
}

impl PgBillRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn bill_from_row(row: &PgRow) -> Result<Bill, sqlx::Error> {
    Ok(Bill::new(
        row.try_get("id")?,
        row.try_get("year")?,
        row.try_get("title")?,
        row.try_get("propose_date")?,
        row.try_get("created_at")?,
    ))
}

#[async_trait]
impl BillRepository for PgBillRepository {
    async fn upsert(&self, new_bill: NewBill) -> Result<Bill, AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO bills (year, title, propose_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (year, title) DO NOTHING
            RETURNING id, year, title, propose_date, created_at
            "#,
        )
        .bind(new_bill.year)
        .bind(&new_bill.title)
        .bind(new_bill.propose_date)
        .fetch_optional(self.pool.as_ref())
        .await?;

        if let Some(row) = inserted {
            return Ok(bill_from_row(&row)?);
        }

        self.find(new_bill.year, &new_bill.title).await?.ok_or_else(|| {
            AppError::internal(
                "Bill vanished after conflicting insert",
                serde_json::json!({ "year": new_bill.year, "title": new_bill.title }),
            )
        })
    }

    async fn find(&self, year: i32, title: &str) -> Result<Option<Bill>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, year, title, propose_date, created_at
            FROM bills
            WHERE year = $1 AND title = $2
            "#,
        )
        .bind(year)
        .bind(title)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.as_ref().map(bill_from_row).transpose()?)
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<Bill>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, year, title, propose_date, created_at
            FROM bills
            WHERE year = $1
            ORDER BY id
            "#,
        )
        .bind(year)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .iter()
            .map(bill_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn count(&self, year: Option<i32>) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE ($1::int IS NULL OR year = $1)")
                .bind(year)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
