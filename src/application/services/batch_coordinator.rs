//! Fan-out of bill-tasks over a bounded worker pool.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::application::services::candidate_fetcher::CandidateFetcher;
use crate::application::services::engagement_prober::EngagementProber;
use crate::application::services::filter_chain::FilterChain;
use crate::application::services::resolution_service::{BillOutcome, ResolutionService};
use crate::config::ResolverConfig;
use crate::domain::entities::{BillTitle, ResolutionResult};
use crate::domain::progress::{ProgressEvent, ProgressSink, StopSignal, TaskState};
use crate::domain::providers::{ScrapingBackend, SearchProvider};
use crate::domain::repositories::{BillRepository, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::EmbeddingCache;
use crate::utils::ordered_set::OrderedSet;

/// Why a bill-task ended in `Failed`.
#[derive(Debug)]
pub enum FailureReason {
    Error(AppError),
    TimedOut(Duration),
    Panicked(String),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Error(e) => e.code(),
            FailureReason::TimedOut(_) => "timeout",
            FailureReason::Panicked(_) => "panic",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Error(e) => write!(f, "{e}"),
            FailureReason::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            FailureReason::Panicked(msg) => write!(f, "task panicked: {msg}"),
        }
    }
}

#[derive(Debug)]
pub struct TaskFailure {
    pub title: BillTitle,
    pub reason: FailureReason,
}

/// Counts shown to the operator after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub matched: usize,
    pub no_match: usize,
    pub already_resolved: usize,
    pub failed: usize,
    pub duplicates: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "match={} no_match={} failed={} (already resolved: {}, duplicates: {})",
            self.matched, self.no_match, self.failed, self.already_resolved, self.duplicates
        )
    }
}

/// Everything a batch produced. `results` keeps input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<ResolutionResult>,
    pub failures: Vec<TaskFailure>,
    pub already_resolved: usize,
    pub duplicates: usize,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let matched = self.results.iter().filter(|r| r.is_match()).count();
        BatchSummary {
            matched,
            no_match: self.results.len() - matched,
            already_resolved: self.already_resolved,
            failed: self.failures.len(),
            duplicates: self.duplicates,
        }
    }
}

enum TaskOutcome {
    Completed(BillOutcome),
    Failed(FailureReason),
}

/// Runs [`ResolutionService`] for many bills at once.
///
/// Each batch builds its own filter chain, so the recency cutoff is measured
/// from when the batch starts. The embedding cache is the only state shared
/// between tasks.
pub struct BatchCoordinator<B: BillRepository, L: LinkRepository> {
    bill_repository: Arc<B>,
    link_repository: Arc<L>,
    search: Arc<dyn SearchProvider>,
    scraping: Arc<dyn ScrapingBackend>,
    cache: Arc<EmbeddingCache>,
    progress: ProgressSink,
    stop: StopSignal,
}

impl<B, L> BatchCoordinator<B, L>
where
    B: BillRepository + 'static,
    L: LinkRepository + 'static,
{
    pub fn new(
        bill_repository: Arc<B>,
        link_repository: Arc<L>,
        search: Arc<dyn SearchProvider>,
        scraping: Arc<dyn ScrapingBackend>,
        cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            bill_repository,
            link_repository,
            search,
            scraping,
            cache,
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

    /// Resolves every bill and blocks until each task is `Done` or `Failed`.
    ///
    /// Duplicate titles (same year and normalized title) run once. A failing
    /// task never affects the others; it is reported in
    /// [`BatchReport::failures`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] if `config` is invalid. Nothing is
    /// launched in that case. No other error escapes a batch.
    pub async fn resolve_batch(
        &self,
        bills: Vec<BillTitle>,
        config: &ResolverConfig,
    ) -> Result<BatchReport, AppError> {
        config.validate()?;

        let service = Arc::new(self.build_service(config)?);

        let submitted = bills.len();
        let mut keys = OrderedSet::new();
        let queue: VecDeque<(usize, BillTitle)> = bills
            .into_iter()
            .filter(|title| keys.insert(title.key()))
            .enumerate()
            .collect();
        let duplicates = submitted - queue.len();
        if duplicates > 0 {
            info!(duplicates, "duplicate bill titles collapsed");
        }

        for (_, title) in &queue {
            self.progress.emit(ProgressEvent::new(
                None,
                title.year,
                &title.raw_title,
                TaskState::Queued,
            ));
        }

        let task_count = queue.len();
        let workers = config.max_workers.min(task_count).max(1);
        info!(bills = task_count, workers, "batch started");

        let queue = Arc::new(Mutex::new(queue));
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            handles.push(tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&service),
                config.task_timeout,
            )));
        }

        let mut finished: Vec<(usize, BillTitle, TaskOutcome)> = Vec::with_capacity(task_count);
        for handle in handles {
            match handle.await {
                Ok(mut done) => finished.append(&mut done),
                Err(e) => error!(error = %e, "batch worker aborted"),
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut report = BatchReport {
            duplicates,
            ..BatchReport::default()
        };
        for (_, title, outcome) in finished {
            match outcome {
                TaskOutcome::Completed(BillOutcome::AlreadyResolved(result)) => {
                    counter!("bill_resolutions_total", "outcome" => "already_resolved")
                        .increment(1);
                    report.already_resolved += 1;
                    report.results.push(result);
                }
                TaskOutcome::Completed(BillOutcome::Resolved { result, .. }) => {
                    let outcome = if result.is_match() { "match" } else { "no_match" };
                    counter!("bill_resolutions_total", "outcome" => outcome).increment(1);
                    report.results.push(result);
                }
                TaskOutcome::Failed(reason) => {
                    counter!("bill_resolutions_total", "outcome" => "failed").increment(1);
                    warn!(
                        year = title.year,
                        title = %title.raw_title,
                        code = reason.code(),
                        error = %reason,
                        "bill-task failed"
                    );
                    self.progress.emit(
                        ProgressEvent::new(None, title.year, &title.raw_title, TaskState::Failed)
                            .with_detail(reason.to_string()),
                    );
                    report.failures.push(TaskFailure { title, reason });
                }
            }
        }

        info!(summary = %report.summary(), "batch finished");
        Ok(report)
    }

    fn build_service(&self, config: &ResolverConfig) -> Result<ResolutionService<B, L>, AppError> {
        let filters = FilterChain::from_config(config, Utc::now(), Arc::clone(&self.cache))?;
        Ok(ResolutionService::new(
            Arc::clone(&self.bill_repository),
            Arc::clone(&self.link_repository),
            CandidateFetcher::new(Arc::clone(&self.search), config.search_page_size),
            filters,
            EngagementProber::new(Arc::clone(&self.scraping), config.max_expand_attempts),
            config.engagement_floor,
        )
        .with_progress(self.progress.clone())
        .with_stop_signal(self.stop.clone()))
    }
}

/// Pops bills until the queue is empty. Each bill runs in its own task so a
/// panic or a timeout stays confined to that bill.
async fn run_worker<B, L>(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<(usize, BillTitle)>>>,
    service: Arc<ResolutionService<B, L>>,
    task_timeout: Duration,
) -> Vec<(usize, BillTitle, TaskOutcome)>
where
    B: BillRepository + 'static,
    L: LinkRepository + 'static,
{
    let mut done = Vec::new();

    loop {
        let Some((index, title)) = queue.lock().await.pop_front() else {
            break;
        };

        if service.stop_signal().is_stopped() {
            let reason = FailureReason::Error(AppError::cancelled(
                "Pipeline stopped before the bill started",
                json!({ "year": title.year }),
            ));
            done.push((index, title, TaskOutcome::Failed(reason)));
            continue;
        }

        let task_service = Arc::clone(&service);
        let task_title = title.clone();
        let handle = tokio::spawn(async move {
            tokio::time::timeout(task_timeout, task_service.resolve_bill(&task_title)).await
        });

        let outcome = match handle.await {
            Ok(Ok(Ok(outcome))) => TaskOutcome::Completed(outcome),
            Ok(Ok(Err(e))) => TaskOutcome::Failed(FailureReason::Error(e)),
            Ok(Err(_elapsed)) => TaskOutcome::Failed(FailureReason::TimedOut(task_timeout)),
            Err(e) => TaskOutcome::Failed(FailureReason::Panicked(e.to_string())),
        };
        done.push((index, title, outcome));
    }

    debug!(worker_id, processed = done.len(), "worker finished");
    done
}
