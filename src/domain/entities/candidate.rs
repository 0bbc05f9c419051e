//! Candidate articles: transient, never persisted individually.

use chrono::{DateTime, Utc};

/// A news article returned by a search query, not yet qualified.
///
/// `published_at` is `None` when the provider's timestamp could not be parsed;
/// such candidates are rejected by the recency filter rather than defaulted.
/// `similarity` and `engagement` stay `None` until computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub similarity: Option<f64>,
    pub engagement: Option<u32>,
}

impl Candidate {
    pub fn new(title: String, url: String, published_at: Option<DateTime<Utc>>) -> Self {
        Self {
            title,
            url,
            published_at,
            similarity: None,
            engagement: None,
        }
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Completes a scored candidate with its measured engagement.
    ///
    /// Returns `None` if similarity has not been computed yet.
    pub fn into_probed(mut self, engagement: u32) -> Option<ProbedCandidate> {
        self.engagement = Some(engagement);
        let similarity = self.similarity?;
        Some(ProbedCandidate {
            candidate: self,
            similarity,
            engagement,
        })
    }
}

/// A candidate that passed the filter chain and was probed for engagement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedCandidate {
    pub candidate: Candidate,
    pub similarity: f64,
    pub engagement: u32,
}

impl ProbedCandidate {
    pub fn new(candidate: Candidate, similarity: f64, engagement: u32) -> Self {
        Self {
            candidate: Candidate {
                similarity: Some(similarity),
                engagement: Some(engagement),
                ..candidate
            },
            similarity,
            engagement,
        }
    }
}

/// Parses a provider publish timestamp.
///
/// Accepts RFC 2822 (`Tue, 14 Jan 2025 09:30:00 +0900`, what news search
/// APIs emit) and RFC 3339. Anything else yields `None`.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
