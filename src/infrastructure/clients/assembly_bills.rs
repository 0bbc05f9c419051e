//! National Assembly open API client (`TVBPMBILL11`, bills by assembly).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use super::{ClientError, build_http_client, ensure_success};
use crate::domain::providers::{BillSource, SourcedBill};
use crate::error::AppError;
use crate::utils::ordered_set::OrderedSet;
use crate::utils::title_normalizer::normalize_title;

/// Assemblies queried for every year; bills are then filtered by proposal date.
pub const DEFAULT_AGES: [u32; 3] = [20, 21, 22];

pub const PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct BillRow {
    #[serde(rename = "BILL_NAME", default)]
    bill_name: Option<String>,
    #[serde(rename = "PROPOSE_DT", default)]
    propose_dt: Option<String>,
}

/// Pages through the bill listing of each assembly.
pub struct AssemblyBillClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    ages: Vec<u32>,
    page_size: usize,
}

impl AssemblyBillClient {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.to_string(),
            api_key: api_key.map(String::from),
            ages: DEFAULT_AGES.to_vec(),
            page_size: PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_ages(mut self, ages: Vec<u32>) -> Self {
        self.ages = ages;
        self
    }

    async fn fetch_page(&self, age: u32, page: usize) -> Result<Vec<BillRow>, ClientError> {
        let mut request = self.client.get(&self.base_url).query(&[
            ("Type", "json".to_string()),
            ("AGE", age.to_string()),
            ("pIndex", page.to_string()),
            ("pSize", self.page_size.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("KEY", key)]);
        }

        let body: Value = ensure_success(request.send().await?)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("bill listing: {e}")))?;

        parse_rows(&body)
    }

    /// All rows of one assembly. A failing page stops paging for that assembly.
    async fn rows_for_age(&self, age: u32) -> Vec<BillRow> {
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            match self.fetch_page(age, page).await {
                Ok(page_rows) => {
                    let n = page_rows.len();
                    rows.extend(page_rows);
                    if n < self.page_size {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    warn!(age, page, error = %e, "bill listing page failed");
                    break;
                }
            }
        }
        info!(age, rows = rows.len(), "bill listing fetched");
        rows
    }
}

/// Extracts `TVBPMBILL11[1].row`. A missing row list means "no more data".
fn parse_rows(body: &Value) -> Result<Vec<BillRow>, ClientError> {
    let Some(row) = body
        .get("TVBPMBILL11")
        .and_then(|sections| sections.get(1))
        .and_then(|section| section.get("row"))
    else {
        return Ok(Vec::new());
    };

    let row = match row {
        Value::Object(_) => Value::Array(vec![row.clone()]),
        other => other.clone(),
    };

    serde_json::from_value(row).map_err(|e| ClientError::InvalidResponse(format!("bill row: {e}")))
}

/// Accepts `YYYY-MM-DD` and `YYYYMMDD`.
fn parse_propose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
}

#[async_trait]
impl BillSource for AssemblyBillClient {
    async fn bills_for_year(&self, year: i32) -> Result<Vec<SourcedBill>, AppError> {
        let prefix = year.to_string();
        let mut seen = OrderedSet::new();
        let mut bills = Vec::new();

        for &age in &self.ages {
            for row in self.rows_for_age(age).await {
                let propose_dt = row.propose_dt.unwrap_or_default();
                if !propose_dt.starts_with(&prefix) {
                    continue;
                }
                let title = row.bill_name.unwrap_or_default().trim().to_string();
                if title.is_empty() || !seen.insert(normalize_title(&title)) {
                    continue;
                }
                bills.push(SourcedBill {
                    title,
                    propose_date: parse_propose_date(&propose_dt),
                });
            }
        }

        Ok(bills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(rows: Value) -> Value {
        json!({
            "TVBPMBILL11": [
                { "head": [{ "list_total_count": 3 }, { "RESULT": { "CODE": "INFO-000" } }] },
                { "row": rows }
            ]
        })
    }

    #[test]
    fn test_parse_rows_handles_single_object_and_missing() {
        let single = listing(json!({ "BILL_NAME": "A법", "PROPOSE_DT": "2025-01-02" }));
        assert_eq!(parse_rows(&single).unwrap().len(), 1);

        let none = json!({ "RESULT": { "CODE": "INFO-200", "MESSAGE": "no data" } });
        assert!(parse_rows(&none).unwrap().is_empty());
    }

    #[test]
    fn test_parse_propose_date_formats() {
        assert_eq!(
            parse_propose_date("2025-03-04"),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
        assert_eq!(
            parse_propose_date("20250304"),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
        assert!(parse_propose_date("").is_none());
    }

    #[tokio::test]
    async fn test_bills_for_year_filters_and_dedups() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("AGE", "22"))
            .and(query_param("pIndex", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
                { "BILL_NAME": "청소년 보호법 일부개정법률안", "PROPOSE_DT": "2025-01-10" },
                { "BILL_NAME": "항공안전법 일부개정법률안", "PROPOSE_DT": "2024-12-30" },
                { "BILL_NAME": "청소년  보호법 일부개정법률안", "PROPOSE_DT": "2025-02-01" },
                { "BILL_NAME": "디자인보호법 일부개정법률안", "PROPOSE_DT": "2025-03-01" }
            ]))))
            .mount(&server)
            .await;

        let client = AssemblyBillClient::new(&server.uri(), Some("k"), Duration::from_secs(5))
            .unwrap()
            .with_ages(vec![22]);

        let bills = client.bills_for_year(2025).await.unwrap();
        let titles: Vec<_> = bills.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["청소년 보호법 일부개정법률안", "디자인보호법 일부개정법률안"]
        );
        assert_eq!(bills[0].propose_date, NaiveDate::from_ymd_opt(2025, 1, 10));
    }

    #[tokio::test]
    async fn test_paging_continues_until_short_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("pIndex", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
                { "BILL_NAME": "A법", "PROPOSE_DT": "2025-01-01" },
                { "BILL_NAME": "B법", "PROPOSE_DT": "2025-01-02" }
            ]))))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("pIndex", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
                { "BILL_NAME": "C법", "PROPOSE_DT": "2025-01-03" }
            ]))))
            .mount(&server)
            .await;

        let client = AssemblyBillClient::new(&server.uri(), None, Duration::from_secs(5))
            .unwrap()
            .with_ages(vec![21])
            .with_page_size(2);

        let bills = client.bills_for_year(2025).await.unwrap();
        assert_eq!(bills.len(), 3);
    }

    #[tokio::test]
    async fn test_failing_page_stops_only_that_assembly() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("AGE", "21"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("AGE", "22"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(json!([
                { "BILL_NAME": "A법", "PROPOSE_DT": "2025-01-01" }
            ]))))
            .mount(&server)
            .await;

        let client = AssemblyBillClient::new(&server.uri(), None, Duration::from_secs(5))
            .unwrap()
            .with_ages(vec![21, 22]);

        let bills = client.bills_for_year(2025).await.unwrap();
        assert_eq!(bills.len(), 1);
    }
}
