//! Recency, host and similarity gates applied to every candidate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::domain::entities::Candidate;
use crate::error::AppError;
use crate::infrastructure::cache::EmbeddingCache;
use crate::utils::similarity::cosine_similarity;
use crate::utils::url_normalizer::host_of;

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Missing or unparseable publish timestamp.
    UnknownDate,
    /// Published before the recency cutoff.
    TooOld,
    /// URL host does not match the trusted pattern.
    UntrustedHost,
    /// Title similarity below the threshold.
    Dissimilar(f64),
}

/// Outcome of running one candidate through the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The candidate, with its similarity filled in.
    Passed(Candidate),
    Rejected(Rejection),
}

/// Applies, in order: recency, host, similarity. Stops at the first failure.
///
/// The cutoff is fixed when the chain is built, from the pipeline start time.
/// A candidate published exactly at the cutoff passes.
pub struct FilterChain {
    recency_cutoff: DateTime<Utc>,
    trusted_host: Regex,
    similarity_threshold: f64,
    cache: Arc<EmbeddingCache>,
}

impl FilterChain {
    pub fn new(
        recency_cutoff: DateTime<Utc>,
        trusted_host: Regex,
        similarity_threshold: f64,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            recency_cutoff,
            trusted_host,
            similarity_threshold,
            cache,
        }
    }

    /// Builds the chain for a run started at `run_started_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] if the host pattern does not compile
    /// or the recency window is out of range.
    pub fn from_config(
        config: &ResolverConfig,
        run_started_at: DateTime<Utc>,
        cache: Arc<EmbeddingCache>,
    ) -> Result<Self, AppError> {
        Ok(Self::new(
            config.recency_cutoff(run_started_at)?,
            config.host_regex()?,
            config.similarity_threshold,
            cache,
        ))
    }

    pub fn recency_cutoff(&self) -> DateTime<Utc> {
        self.recency_cutoff
    }

    /// Runs one candidate through the chain.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures; the cheap recency and host checks run first.
    pub async fn evaluate(
        &self,
        bill_title: &str,
        candidate: Candidate,
    ) -> Result<FilterOutcome, AppError> {
        match candidate.published_at {
            None => return Ok(self.reject(&candidate, Rejection::UnknownDate)),
            Some(published) if published < self.recency_cutoff => {
                return Ok(self.reject(&candidate, Rejection::TooOld));
            }
            Some(_) => {}
        }

        let trusted = host_of(&candidate.url).is_some_and(|host| self.trusted_host.is_match(&host));
        if !trusted {
            return Ok(self.reject(&candidate, Rejection::UntrustedHost));
        }

        let bill_vector = self.cache.embed(bill_title).await?;
        let candidate_vector = self.cache.embed(&candidate.title).await?;
        let similarity = cosine_similarity(&bill_vector, &candidate_vector);

        if similarity < self.similarity_threshold {
            return Ok(self.reject(&candidate, Rejection::Dissimilar(similarity)));
        }

        Ok(FilterOutcome::Passed(candidate.with_similarity(similarity)))
    }

    /// Evaluates all candidates, keeping survivors in input order.
    pub async fn apply(
        &self,
        bill_title: &str,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<Candidate>, AppError> {
        let mut survivors = Vec::new();
        for candidate in candidates {
            if let FilterOutcome::Passed(c) = self.evaluate(bill_title, candidate).await? {
                survivors.push(c);
            }
        }
        Ok(survivors)
    }

    fn reject(&self, candidate: &Candidate, reason: Rejection) -> FilterOutcome {
        debug!(url = %candidate.url, reason = ?reason, "candidate dropped");
        FilterOutcome::Rejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::providers::MockEmbeddingProvider;
    use chrono::Duration;

    fn chain(now: DateTime<Utc>, threshold: f64) -> FilterChain {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().returning(|text| {
            Ok(match text {
                t if t.contains("Youth") => vec![1.0, 0.0],
                t if t.contains("opposite") => vec![-1.0, 0.0],
                _ => vec![0.0, 1.0],
            })
        });
        FilterChain::new(
            now - Duration::days(800),
            Regex::new(r"^n\.news\.naver\.com$").unwrap(),
            threshold,
            Arc::new(EmbeddingCache::new(Arc::new(provider))),
        )
    }

    fn candidate(title: &str, url: &str, published_at: Option<DateTime<Utc>>) -> Candidate {
        Candidate::new(title.to_string(), url.to_string(), published_at)
    }

    const TRUSTED: &str = "https://n.news.naver.com/mnews/article/001/0001";

    #[tokio::test]
    async fn test_recency_boundary_is_inclusive() {
        let now = Utc::now();
        let chain = chain(now, 0.0);
        let cutoff = chain.recency_cutoff();

        let at_cutoff = candidate("Youth Protection Act news", TRUSTED, Some(cutoff));
        assert!(matches!(
            chain.evaluate("Youth Protection Act", at_cutoff).await.unwrap(),
            FilterOutcome::Passed(_)
        ));

        let just_before = candidate(
            "Youth Protection Act news",
            TRUSTED,
            Some(cutoff - Duration::seconds(1)),
        );
        assert_eq!(
            chain.evaluate("Youth Protection Act", just_before).await.unwrap(),
            FilterOutcome::Rejected(Rejection::TooOld)
        );
    }

    #[tokio::test]
    async fn test_unknown_date_rejected() {
        let chain = chain(Utc::now(), 0.0);
        let c = candidate("Youth", TRUSTED, None);
        assert_eq!(
            chain.evaluate("Youth", c).await.unwrap(),
            FilterOutcome::Rejected(Rejection::UnknownDate)
        );
    }

    #[tokio::test]
    async fn test_untrusted_host_rejected_before_embedding() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_embed().never();
        let now = Utc::now();
        let chain = FilterChain::new(
            now - Duration::days(800),
            Regex::new(r"^n\.news\.naver\.com$").unwrap(),
            0.0,
            Arc::new(EmbeddingCache::new(Arc::new(provider))),
        );

        for url in [
            "https://press.example.com/a/1",
            "https://n.news.naver.com.evil.io/a",
            "not a url",
        ] {
            let c = candidate("Youth", url, Some(now));
            assert_eq!(
                chain.evaluate("Youth", c).await.unwrap(),
                FilterOutcome::Rejected(Rejection::UntrustedHost)
            );
        }
    }

    #[tokio::test]
    async fn test_similarity_threshold() {
        let now = Utc::now();
        let chain = chain(now, 0.0);

        let opposite = candidate("opposite view", TRUSTED, Some(now));
        assert_eq!(
            chain.evaluate("Youth Protection Act", opposite).await.unwrap(),
            FilterOutcome::Rejected(Rejection::Dissimilar(-1.0))
        );

        let related = candidate("Youth Protection Act passes", TRUSTED, Some(now));
        match chain.evaluate("Youth Protection Act", related).await.unwrap() {
            FilterOutcome::Passed(c) => assert_eq!(c.similarity, Some(1.0)),
            other => panic!("expected pass, got {other:?}"),
        }

        let orthogonal = candidate("weather report", TRUSTED, Some(now));
        assert!(matches!(
            chain.evaluate("Youth Protection Act", orthogonal).await.unwrap(),
            FilterOutcome::Passed(_)
        ));
    }

    #[tokio::test]
    async fn test_stricter_threshold_drops_orthogonal() {
        let now = Utc::now();
        let chain = chain(now, 0.5);
        let survivors = chain
            .apply(
                "Youth Protection Act",
                vec![
                    candidate("weather report", TRUSTED, Some(now)),
                    candidate("Youth Protection Act passes", TRUSTED, Some(now)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].title, "Youth Protection Act passes");
    }
}
