//! The single write path for resolution results.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::domain::entities::{InsertOutcome, NO_MATCH_URL, ResolutionResult};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::url_normalizer::canonicalize_url;

/// What the gate did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Recorded,
    /// Another task or an earlier run already holds this key.
    AlreadyRecorded,
}

/// Canonicalizes the URL of a match so it can be used as the dedup key.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the URL cannot be canonicalized.
pub fn canonicalize_result(result: ResolutionResult) -> Result<ResolutionResult, AppError> {
    match result {
        ResolutionResult::Match {
            bill_id,
            year,
            news_title,
            canonical_url,
            engagement,
            similarity,
        } => {
            let canonical_url = canonicalize_url(&canonical_url).map_err(|e| {
                AppError::internal(
                    "Winning URL could not be canonicalized",
                    json!({ "url": canonical_url, "reason": e.to_string() }),
                )
            })?;
            Ok(ResolutionResult::Match {
                bill_id,
                year,
                news_title,
                canonical_url,
                engagement,
                similarity,
            })
        }
        no_match => Ok(no_match),
    }
}

/// Check-then-insert writer. Never overwrites.
///
/// The check only saves a round trip; the repository's uniqueness constraint
/// is what resolves two tasks racing on the same key.
pub struct PersistenceGate<L: LinkRepository> {
    link_repository: Arc<L>,
}

impl<L: LinkRepository> PersistenceGate<L> {
    pub fn new(link_repository: Arc<L>) -> Self {
        Self { link_repository }
    }

    /// Canonicalizes `result` and writes it unless its key is already taken.
    ///
    /// A `Match` is keyed by `(bill_id, canonical_url)`; a `NoMatch` by the
    /// bill's sentinel row. Returns the canonicalized result.
    pub async fn record(
        &self,
        result: ResolutionResult,
    ) -> Result<(ResolutionResult, GateOutcome), AppError> {
        let result = canonicalize_result(result)?;
        let outcome = self.write(&result).await?;
        Ok((result, outcome))
    }

    async fn write(&self, result: &ResolutionResult) -> Result<GateOutcome, AppError> {
        let new_link = result.to_new_link();
        let key_url = match result {
            ResolutionResult::Match { canonical_url, .. } => canonical_url.as_str(),
            ResolutionResult::NoMatch { .. } => NO_MATCH_URL,
        };

        if self
            .link_repository
            .exists(new_link.bill_id, key_url)
            .await?
        {
            debug!(bill_id = new_link.bill_id, url = key_url, "result already recorded");
            return Ok(GateOutcome::AlreadyRecorded);
        }

        match self.link_repository.insert(new_link).await {
            Ok(InsertOutcome::Inserted(link)) => {
                info!(
                    bill_id = link.bill_id,
                    url = %link.news_url,
                    comment_count = link.comment_count,
                    "resolution recorded"
                );
                Ok(GateOutcome::Recorded)
            }
            Ok(InsertOutcome::AlreadyExists) => Ok(GateOutcome::AlreadyRecorded),
            Err(e) if e.is_conflict() => Ok(GateOutcome::AlreadyRecorded),
            Err(e) => Err(e),
        }
    }
}
