//! Pipeline runtime setup.
//!
//! Handles database connections, client construction, the progress logger
//! and the per-year resolution loop.

use crate::application::services::{
    BatchCoordinator, BillCatalogService, BodyCollectionService,
};
use crate::config::Config;
use crate::domain::progress::{ProgressEvent, ProgressSink, StopSignal, TaskState};
use crate::domain::providers::{
    ArticleBodySource, BillSource, EmbeddingProvider, ScrapingBackend, SearchProvider,
};
use crate::domain::repositories::{BillRepository, LinkRepository};
use crate::infrastructure::cache::EmbeddingCache;
use crate::infrastructure::clients::{
    AssemblyBillClient, BrowserlessBackend, EmbeddingApiClient, HttpArticleBodySource,
    NaverNewsClient,
};
use crate::infrastructure::persistence::{
    InMemoryBillRepository, InMemoryLinkRepository, PgBillRepository, PgLinkRepository,
};

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Flags of one pipeline invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides `RESOLVER_YEARS` when non-empty.
    pub years: Vec<i32>,
    /// Use in-memory stores; nothing is written to the database.
    pub dry_run: bool,
    pub skip_bodies: bool,
}

/// External collaborators shared by every batch of a run.
pub struct Providers {
    pub search: Arc<dyn SearchProvider>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub scraping: Arc<dyn ScrapingBackend>,
    pub bills: Option<Arc<dyn BillSource>>,
    pub bodies: Arc<dyn ArticleBodySource>,
}

impl Providers {
    /// Builds the HTTP clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client or a CSS selector cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.http_timeout;

        let search = NaverNewsClient::new(
            &config.search_api_url,
            &config.search_client_id,
            &config.search_client_secret,
            timeout,
        )
        .context("Failed to build search client")?;

        let embeddings = EmbeddingApiClient::new(
            &config.embedding_api_url,
            &config.embedding_model,
            config.embedding_api_key.as_deref(),
            timeout,
        )
        .context("Failed to build embedding client")?;

        let scraping = BrowserlessBackend::new(
            &config.browserless_url,
            config.browserless_token.as_deref(),
            &config.resolver.reaction_selector,
            &config.resolver.reveal_selector,
            timeout,
        )
        .context("Failed to build scraping backend")?;

        let bills: Option<Arc<dyn BillSource>> = match config.bill_api_key {
            Some(ref key) => Some(Arc::new(
                AssemblyBillClient::new(&config.bill_api_url, Some(key), timeout)
                    .context("Failed to build bill API client")?,
            )),
            None => None,
        };

        let bodies =
            HttpArticleBodySource::new(timeout).context("Failed to build article body client")?;

        Ok(Self {
            search: Arc::new(search),
            embeddings: Arc::new(embeddings),
            scraping: Arc::new(scraping),
            bills,
            bodies: Arc::new(bodies),
        })
    }
}

/// Runs the pipeline for every configured year.
///
/// Initializes:
/// - PostgreSQL connection pool (with retries) and migrations, unless `dry_run`
/// - HTTP clients and the run-scoped embedding cache
/// - Progress logger
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migrations fail
/// - A client cannot be built
/// - The resolver configuration is invalid
/// - The bill catalog cannot be read
pub async fn run(config: Config, options: RunOptions, stop: StopSignal) -> Result<()> {
    let providers = Providers::from_config(&config)?;

    if options.dry_run {
        tracing::warn!("Dry run: results are kept in memory and discarded");
        let bills = InMemoryBillRepository::new();
        let links = InMemoryLinkRepository::new(bills.clone());
        return run_with(&config, &options, Arc::new(bills), Arc::new(links), providers, stop)
            .await;
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set unless --dry-run is given")?;
    let pool = connect_database(&config, database_url).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let pool = Arc::new(pool);
    let bills = Arc::new(PgBillRepository::new(Arc::clone(&pool)));
    let links = Arc::new(PgLinkRepository::new(pool));
    run_with(&config, &options, bills, links, providers, stop).await
}

/// Opens the pool, retrying with exponential backoff.
pub async fn connect_database(config: &Config, database_url: &str) -> Result<PgPool> {
    let strategy = ExponentialBackoff::from_millis(200)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(config.db_connect_retries.saturating_sub(1));

    Retry::spawn(strategy, || async {
        PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime))
            .connect(database_url)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Database connection attempt failed"))
    })
    .await
    .context("Failed to connect to database")
}

async fn run_with<B, L>(
    config: &Config,
    options: &RunOptions,
    bill_repository: Arc<B>,
    link_repository: Arc<L>,
    providers: Providers,
    stop: StopSignal,
) -> Result<()>
where
    B: BillRepository + 'static,
    L: LinkRepository + 'static,
{
    let (progress, progress_rx) = ProgressSink::channel(config.progress_queue_capacity);
    let logger = tokio::spawn(log_progress(progress_rx));

    let cache = Arc::new(EmbeddingCache::new(Arc::clone(&providers.embeddings)));
    let catalog = BillCatalogService::new(Arc::clone(&bill_repository), providers.bills.clone());
    let coordinator = BatchCoordinator::new(
        bill_repository,
        Arc::clone(&link_repository),
        Arc::clone(&providers.search),
        Arc::clone(&providers.scraping),
        Arc::clone(&cache),
    )
    .with_progress(progress)
    .with_stop_signal(stop.clone());

    let years = if options.years.is_empty() {
        config.years.clone()
    } else {
        options.years.clone()
    };

    for year in years {
        if stop.is_stopped() {
            tracing::warn!(year, "Stop requested, skipping remaining years");
            break;
        }

        let titles = catalog
            .bills_for_year(year)
            .await
            .with_context(|| format!("Failed to load bills for {year}"))?;
        if titles.is_empty() {
            tracing::info!(year, "No bills to resolve");
            continue;
        }

        let report = coordinator.resolve_batch(titles, &config.resolver).await?;
        tracing::info!(year, summary = %report.summary(), "Year finished");
    }

    let (hits, misses) = cache.stats();
    tracing::info!(entries = cache.len(), hits, misses, "Embedding cache");

    drop(coordinator);
    if let Err(e) = logger.await {
        tracing::warn!(error = %e, "Progress logger stopped unexpectedly");
    }

    if options.skip_bodies || stop.is_stopped() {
        return Ok(());
    }

    let bodies = BodyCollectionService::new(link_repository, providers.bodies);
    let report = bodies.collect(config.body_collection_limit).await?;
    tracing::info!(stored = report.stored, failed = report.failed, "Body collection finished");

    Ok(())
}

/// Logs progress events until every sender is gone.
async fn log_progress(mut rx: mpsc::Receiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event.state {
            TaskState::Done | TaskState::Failed => tracing::info!(
                bill_id = event.bill_id,
                year = event.year,
                title = %event.title,
                state = %event.state,
                detail = event.detail.as_deref(),
                "bill-task finished"
            ),
            _ => tracing::trace!(
                bill_id = event.bill_id,
                year = event.year,
                state = %event.state,
                "bill-task progress"
            ),
        }
    }
}
