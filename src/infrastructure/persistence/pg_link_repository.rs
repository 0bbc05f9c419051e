//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::entities::{Bill, InsertOutcome, NO_MATCH_URL, NewNewsLink, NewsLink};
use crate::domain::repositories::{LinkCounts, LinkRepository};
use crate::error::AppError;

/// PostgreSQL repository for resolution results.
///
/// Every write is `INSERT ... ON CONFLICT DO NOTHING`; the unique
/// `(bill_id, news_url)` constraint decides which of two racing writers wins.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn link_from_row(row: &PgRow) -> Result<NewsLink, sqlx::Error> {
    let comment_count: i32 = row.try_get("comment_count")?;
    Ok(NewsLink::new(
        row.try_get("id")?,
        row.try_get("bill_id")?,
        row.try_get("news_title")?,
        row.try_get("news_url")?,
        u32::try_from(comment_count).unwrap_or(0),
        row.try_get("similarity")?,
        row.try_get("body")?,
        row.try_get("created_at")?,
    ))
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn exists(&self, bill_id: i64, news_url: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bill_news WHERE bill_id = $1 AND news_url = $2)",
        )
        .bind(bill_id)
        .bind(news_url)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn insert(&self, new_link: NewNewsLink) -> Result<InsertOutcome, AppError> {
        let comment_count = i32::try_from(new_link.comment_count).map_err(|_| {
            AppError::internal(
                "Comment count out of range",
                json!({ "comment_count": new_link.comment_count }),
            )
        })?;

        let row = sqlx::query(
            r#"
            INSERT INTO bill_news (bill_id, news_title, news_url, comment_count, similarity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (bill_id, news_url) DO NOTHING
            RETURNING id, bill_id, news_title, news_url, comment_count, similarity, body, created_at
            "#,
        )
        .bind(new_link.bill_id)
        .bind(&new_link.news_title)
        .bind(&new_link.news_url)
        .bind(comment_count)
        .bind(new_link.similarity)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => Ok(InsertOutcome::Inserted(link_from_row(&row)?)),
            None => Ok(InsertOutcome::AlreadyExists),
        }
    }

    async fn get_existing(&self, bill_id: i64) -> Result<Option<NewsLink>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, bill_id, news_title, news_url, comment_count, similarity, body, created_at
            FROM bill_news
            WHERE bill_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(bill_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.as_ref().map(link_from_row).transpose()?)
    }

    async fn list_by_year(&self, year: i32) -> Result<Vec<(Bill, NewsLink)>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT b.id AS b_id, b.year, b.title, b.propose_date, b.created_at AS b_created_at,
                   n.id, n.bill_id, n.news_title, n.news_url, n.comment_count, n.similarity,
                   n.body, n.created_at
            FROM bill_news n
            JOIN bills b ON b.id = n.bill_id
            WHERE b.year = $1
            ORDER BY b.id, n.id
            "#,
        )
        .bind(year)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                let bill = Bill::new(
                    row.try_get("b_id")?,
                    row.try_get("year")?,
                    row.try_get("title")?,
                    row.try_get("propose_date")?,
                    row.try_get("b_created_at")?,
                );
                Ok((bill, link_from_row(row)?))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(AppError::from)
    }

    async fn list_missing_body(&self, limit: i64) -> Result<Vec<NewsLink>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, bill_id, news_title, news_url, comment_count, similarity, body, created_at
            FROM bill_news
            WHERE body IS NULL AND news_url <> $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(NO_MATCH_URL)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .iter()
            .map(link_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn update_body(&self, id: i64, body: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE bill_news SET body = $2 WHERE id = $1")
            .bind(id)
            .bind(body)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "News link not found",
                json!({ "id": id }),
            ));
        }
        Ok(())
    }

    async fn counts(&self) -> Result<LinkCounts, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE news_url <> $1) AS matched,
                COUNT(*) FILTER (WHERE news_url = $1) AS no_match,
                COUNT(*) FILTER (WHERE body IS NOT NULL) AS with_body
            FROM bill_news
            "#,
        )
        .bind(NO_MATCH_URL)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkCounts {
            matched: row.try_get("matched")?,
            no_match: row.try_get("no_match")?,
            with_body: row.try_get("with_body")?,
        })
    }
}
