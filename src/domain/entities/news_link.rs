//! Resolution outcomes and the persisted bill→news link.

use chrono::{DateTime, Utc};

/// Reserved URL of the NoMatch sentinel row. At most one per bill.
pub const NO_MATCH_URL: &str = "(none)";

/// Title stored on the NoMatch sentinel row.
pub const NO_MATCH_TITLE: &str = "(no related news)";

/// The outcome of resolving one bill. Exactly one is persisted per bill.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    Match {
        bill_id: i64,
        year: i32,
        news_title: String,
        canonical_url: String,
        engagement: u32,
        similarity: f64,
    },
    NoMatch {
        bill_id: i64,
        year: i32,
    },
}

impl ResolutionResult {
    pub fn bill_id(&self) -> i64 {
        match self {
            ResolutionResult::Match { bill_id, .. } | ResolutionResult::NoMatch { bill_id, .. } => {
                *bill_id
            }
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            ResolutionResult::Match { year, .. } | ResolutionResult::NoMatch { year, .. } => *year,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, ResolutionResult::Match { .. })
    }

    /// The record the persistence gate writes for this result.
    pub fn to_new_link(&self) -> NewNewsLink {
        match self {
            ResolutionResult::Match {
                bill_id,
                news_title,
                canonical_url,
                engagement,
                similarity,
                ..
            } => NewNewsLink {
                bill_id: *bill_id,
                news_title: news_title.clone(),
                news_url: canonical_url.clone(),
                comment_count: *engagement,
                similarity: *similarity,
            },
            ResolutionResult::NoMatch { bill_id, .. } => NewNewsLink::no_match(*bill_id),
        }
    }
}

/// A durable record keyed by `(bill_id, news_url)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsLink {
    pub id: i64,
    pub bill_id: i64,
    pub news_title: String,
    pub news_url: String,
    pub comment_count: u32,
    pub similarity: f64,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewsLink {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        bill_id: i64,
        news_title: String,
        news_url: String,
        comment_count: u32,
        similarity: f64,
        body: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bill_id,
            news_title,
            news_url,
            comment_count,
            similarity,
            body,
            created_at,
        }
    }

    /// Returns true if this row is the NoMatch sentinel.
    pub fn is_no_match(&self) -> bool {
        self.news_url == NO_MATCH_URL
    }
}

/// Input data for inserting a news link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNewsLink {
    pub bill_id: i64,
    pub news_title: String,
    pub news_url: String,
    pub comment_count: u32,
    pub similarity: f64,
}

impl NewNewsLink {
    /// The sentinel recording that no qualifying article was found.
    pub fn no_match(bill_id: i64) -> Self {
        Self {
            bill_id,
            news_title: NO_MATCH_TITLE.to_string(),
            news_url: NO_MATCH_URL.to_string(),
            comment_count: 0,
            similarity: 0.0,
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.news_url == NO_MATCH_URL
    }
}

/// Result of an insert-if-absent write.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(NewsLink),
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_to_new_link() {
        let result = ResolutionResult::Match {
            bill_id: 7,
            year: 2025,
            news_title: "Youth Protection Act passes committee".into(),
            canonical_url: "https://n.news.naver.com/article/001/1".into(),
            engagement: 12,
            similarity: 0.8,
        };

        let link = result.to_new_link();
        assert_eq!(link.bill_id, 7);
        assert_eq!(link.comment_count, 12);
        assert_eq!(link.news_url, "https://n.news.naver.com/article/001/1");
        assert!(!link.is_no_match());
        assert!(result.is_match());
        assert_eq!(result.year(), 2025);
    }

    #[test]
    fn test_no_match_to_sentinel() {
        let result = ResolutionResult::NoMatch {
            bill_id: 3,
            year: 2024,
        };

        let link = result.to_new_link();
        assert_eq!(link.news_url, NO_MATCH_URL);
        assert_eq!(link.news_title, NO_MATCH_TITLE);
        assert_eq!(link.comment_count, 0);
        assert!(link.is_no_match());
        assert_eq!(result.bill_id(), 3);
    }

    #[test]
    fn test_news_link_sentinel_detection() {
        let link = NewsLink::new(
            1,
            3,
            NO_MATCH_TITLE.into(),
            NO_MATCH_URL.into(),
            0,
            0.0,
            None,
            Utc::now(),
        );
        assert!(link.is_no_match());
    }
}
