//! Bill entities: the raw title as observed and the persisted bill row.

use chrono::{DateTime, NaiveDate, Utc};

use crate::utils::title_normalizer::normalize_title;

/// A bill title as observed for a given year, before it is persisted.
///
/// The raw title is kept for display; [`BillTitle::key`] is what every lookup uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillTitle {
    pub year: i32,
    pub raw_title: String,
}

impl BillTitle {
    pub fn new(year: i32, raw_title: impl Into<String>) -> Self {
        Self {
            year,
            raw_title: raw_title.into(),
        }
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.raw_title)
    }

    /// `(year, normalized title)`, the identity of a bill.
    pub fn key(&self) -> (i32, String) {
        (self.year, self.normalized_title())
    }
}

/// A bill row. `title` is always stored normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: i64,
    pub year: i32,
    pub title: String,
    pub propose_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(
        id: i64,
        year: i32,
        title: String,
        propose_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            year,
            title,
            propose_date,
            created_at,
        }
    }
}

/// Input data for inserting a bill. The constructor normalizes the title.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub year: i32,
    pub title: String,
    pub propose_date: Option<NaiveDate>,
}

impl NewBill {
    pub fn new(year: i32, title: &str, propose_date: Option<NaiveDate>) -> Self {
        Self {
            year,
            title: normalize_title(title),
            propose_date,
        }
    }
}

impl From<&BillTitle> for NewBill {
    fn from(title: &BillTitle) -> Self {
        NewBill::new(title.year, &title.raw_title, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_title_key_is_normalized() {
        let a = BillTitle::new(2025, "Youth  Protection Act ");
        let b = BillTitle::new(2025, "Youth Protection\tAct");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), (2025, "Youth Protection Act".to_string()));
    }

    #[test]
    fn test_same_title_different_year_differs() {
        let a = BillTitle::new(2024, "Aviation Safety Act");
        let b = BillTitle::new(2025, "Aviation Safety Act");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_new_bill_normalizes() {
        let new_bill = NewBill::new(2025, "  항공안전법   일부개정법률안 ", None);
        assert_eq!(new_bill.title, "항공안전법 일부개정법률안");
        assert_eq!(new_bill.year, 2025);
    }

    #[test]
    fn test_new_bill_from_bill_title() {
        let title = BillTitle::new(2025, "Design  Protection Act");
        let new_bill = NewBill::from(&title);
        assert_eq!(new_bill.title, "Design Protection Act");
        assert!(new_bill.propose_date.is_none());
    }
}
