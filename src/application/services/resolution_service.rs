//! The per-bill pipeline: fetch, filter, probe, select, persist.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::application::services::candidate_fetcher::CandidateFetcher;
use crate::application::services::engagement_prober::EngagementProber;
use crate::application::services::filter_chain::FilterChain;
use crate::application::services::persistence_gate::{GateOutcome, PersistenceGate};
use crate::application::services::selector::{Selection, select_best};
use crate::domain::entities::{Bill, BillTitle, NewBill, NewsLink, ResolutionResult};
use crate::domain::progress::{ProgressEvent, ProgressSink, StopSignal, TaskState};
use crate::domain::repositories::{BillRepository, LinkRepository};
use crate::error::AppError;

/// How one bill-task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BillOutcome {
    /// The pipeline ran and its result went through the persistence gate.
    Resolved {
        result: ResolutionResult,
        gate: GateOutcome,
    },
    /// An earlier run already recorded a result; nothing was searched.
    AlreadyResolved(ResolutionResult),
}

impl BillOutcome {
    pub fn result(&self) -> &ResolutionResult {
        match self {
            BillOutcome::Resolved { result, .. } => result,
            BillOutcome::AlreadyResolved(result) => result,
        }
    }

    pub fn into_result(self) -> ResolutionResult {
        match self {
            BillOutcome::Resolved { result, .. } => result,
            BillOutcome::AlreadyResolved(result) => result,
        }
    }
}

/// Resolves single bills. Steps within one bill are strictly sequential.
///
/// # Architecture
///
/// - [`CandidateFetcher`] - one search per bill
/// - [`FilterChain`] - recency, host, similarity
/// - [`EngagementProber`] - one scraping session per survivor
/// - [`select_best`] - engagement floor and tie-break
/// - [`PersistenceGate`] - the only write path for results
///
/// The stop signal is checked before every state transition. A call that is
/// already in flight always finishes first.
pub struct ResolutionService<B: BillRepository, L: LinkRepository> {
    bill_repository: Arc<B>,
    link_repository: Arc<L>,
    gate: PersistenceGate<L>,
    fetcher: CandidateFetcher,
    filters: FilterChain,
    prober: EngagementProber,
    engagement_floor: u32,
    progress: ProgressSink,
    stop: StopSignal,
}

impl<B: BillRepository, L: LinkRepository> ResolutionService<B, L> {
    pub fn new(
        bill_repository: Arc<B>,
        link_repository: Arc<L>,
        fetcher: CandidateFetcher,
        filters: FilterChain,
        prober: EngagementProber,
        engagement_floor: u32,
    ) -> Self {
        Self {
            bill_repository,
            gate: PersistenceGate::new(Arc::clone(&link_repository)),
            link_repository,
            fetcher,
            filters,
            prober,
            engagement_floor,
            progress: ProgressSink::disabled(),
            stop: StopSignal::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Runs the whole pipeline for one bill.
    ///
    /// # Errors
    ///
    /// - [`AppError::TransientFetch`] if the search failed. Nothing is written.
    /// - [`AppError::Cancelled`] if the stop signal was raised between steps.
    /// - Storage and embedding errors as returned by the collaborators.
    ///
    /// A lost insert race is not an error; it yields
    /// [`GateOutcome::AlreadyRecorded`].
    pub async fn resolve_bill(&self, title: &BillTitle) -> Result<BillOutcome, AppError> {
        let bill = self.bill_repository.upsert(NewBill::from(title)).await?;

        if let Some(existing) = self.link_repository.get_existing(bill.id).await? {
            debug!(bill_id = bill.id, year = bill.year, "bill already resolved");
            self.transition(&bill, TaskState::Done, Some("already resolved"));
            return Ok(BillOutcome::AlreadyResolved(result_from_link(&bill, existing)));
        }

        self.enter(&bill, TaskState::Fetching)?;
        let candidates = self.fetcher.fetch(&bill.title).await?;
        let fetched = candidates.len();

        self.enter(&bill, TaskState::Filtering)?;
        let survivors = self.filters.apply(&bill.title, candidates).await?;

        self.enter(&bill, TaskState::Probing)?;
        let mut probed = Vec::with_capacity(survivors.len());
        for candidate in survivors {
            self.ensure_running(&bill, TaskState::Probing)?;
            let engagement = self.prober.probe(&candidate.url).await;
            if let Some(p) = candidate.into_probed(engagement) {
                probed.push(p);
            }
        }

        self.enter(&bill, TaskState::Selecting)?;
        let probed_count = probed.len();
        let result = match select_best(probed, self.engagement_floor) {
            Selection::Winner(winner) => ResolutionResult::Match {
                bill_id: bill.id,
                year: bill.year,
                news_title: winner.candidate.title,
                canonical_url: winner.candidate.url,
                engagement: winner.engagement,
                similarity: winner.similarity,
            },
            Selection::NoMatch => ResolutionResult::NoMatch {
                bill_id: bill.id,
                year: bill.year,
            },
        };

        self.enter(&bill, TaskState::Persisting)?;
        let (result, gate) = self.gate.record(result).await?;

        info!(
            bill_id = bill.id,
            year = bill.year,
            fetched,
            probed = probed_count,
            matched = result.is_match(),
            "bill resolved"
        );
        self.transition(&bill, TaskState::Done, None);

        Ok(BillOutcome::Resolved { result, gate })
    }

    fn enter(&self, bill: &Bill, state: TaskState) -> Result<(), AppError> {
        self.ensure_running(bill, state)?;
        self.transition(bill, state, None);
        Ok(())
    }

    fn ensure_running(&self, bill: &Bill, state: TaskState) -> Result<(), AppError> {
        if self.stop.is_stopped() {
            return Err(AppError::cancelled(
                "Pipeline stopped",
                json!({ "bill_id": bill.id, "before": state.as_str() }),
            ));
        }
        Ok(())
    }

    fn transition(&self, bill: &Bill, state: TaskState, detail: Option<&str>) {
        debug!(bill_id = bill.id, year = bill.year, state = %state, "bill-task transition");
        let event = ProgressEvent::new(Some(bill.id), bill.year, &bill.title, state);
        self.progress.emit(match detail {
            Some(detail) => event.with_detail(detail),
            None => event,
        });
    }
}

fn result_from_link(bill: &Bill, link: NewsLink) -> ResolutionResult {
    if link.is_no_match() {
        ResolutionResult::NoMatch {
            bill_id: bill.id,
            year: bill.year,
        }
    } else {
        ResolutionResult::Match {
            bill_id: bill.id,
            year: bill.year,
            news_title: link.news_title,
            canonical_url: link.news_url,
            engagement: link.comment_count,
            similarity: link.similarity,
        }
    }
}
