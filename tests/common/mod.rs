#![allow(dead_code)]

use async_trait::async_trait;
use bill_news_resolver::application::services::BatchCoordinator;
use bill_news_resolver::domain::providers::{
    EmbeddingProvider, PageSnapshot, ScrapingBackend, ScrapingSession, SearchHit, SearchProvider,
};
use bill_news_resolver::error::AppError;
use bill_news_resolver::infrastructure::cache::EmbeddingCache;
use bill_news_resolver::infrastructure::persistence::{
    InMemoryBillRepository, InMemoryLinkRepository,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TRUSTED: &str = "https://n.news.naver.com/mnews/article";

/// A search hit published `days_ago` days before now.
pub fn hit(title: &str, url: &str, days_ago: i64) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        published_at: (Utc::now() - Duration::days(days_ago)).to_rfc2822(),
    }
}

/// Search results keyed by query. Unknown queries return nothing.
#[derive(Default)]
pub struct ScriptedSearch {
    hits: HashMap<String, Vec<SearchHit>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.hits.insert(query.to_string(), hits);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(query) {
            return Err(AppError::transient(
                "search provider unavailable",
                json!({ "query": query }),
            ));
        }
        Ok(self
            .hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Fixed vectors per text; anything unknown maps to an orthogonal vector.
#[derive(Default)]
pub struct FixedEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
    }
}

/// A unit vector whose cosine with `[1, 0, 0]` is `similarity`.
pub fn vector_with_similarity(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).sqrt(), 0.0]
}

/// The vector every bill title in these tests embeds to.
pub fn bill_vector() -> Vec<f32> {
    vec![1.0, 0.0, 0.0]
}

/// Reaction counts per article URL. Unknown URLs fail to load.
#[derive(Default)]
pub struct FakeComments {
    counts: Arc<HashMap<String, u32>>,
    sessions_open: Arc<AtomicUsize>,
    sessions_total: Arc<AtomicUsize>,
}

impl FakeComments {
    pub fn new(counts: &[(&str, u32)]) -> Self {
        Self {
            counts: Arc::new(
                counts
                    .iter()
                    .map(|(url, n)| (url.to_string(), *n))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.sessions_open.load(Ordering::SeqCst)
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions_total.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    counts: Arc<HashMap<String, u32>>,
    sessions_open: Arc<AtomicUsize>,
}

#[async_trait]
impl ScrapingBackend for FakeComments {
    async fn open_session(&self) -> Result<Box<dyn ScrapingSession>, AppError> {
        self.sessions_open.fetch_add(1, Ordering::SeqCst);
        self.sessions_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            counts: Arc::clone(&self.counts),
            sessions_open: Arc::clone(&self.sessions_open),
        }))
    }
}

#[async_trait]
impl ScrapingSession for FakeSession {
    async fn load(&mut self, url: &str) -> Result<PageSnapshot, AppError> {
        match self.counts.get(url) {
            Some(&reaction_count) => Ok(PageSnapshot {
                reaction_count,
                reveal_available: false,
            }),
            None => Err(AppError::transient("navigation failed", json!({ "url": url }))),
        }
    }

    async fn reveal_more(&mut self) -> Result<PageSnapshot, AppError> {
        Err(AppError::internal("no reveal control", json!({})))
    }

    async fn close(&mut self) {
        self.sessions_open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory stores plus a coordinator wired to the given fakes.
pub struct Harness {
    pub bills: Arc<InMemoryBillRepository>,
    pub links: Arc<InMemoryLinkRepository>,
    pub coordinator: BatchCoordinator<InMemoryBillRepository, InMemoryLinkRepository>,
}

impl Harness {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        embeddings: Arc<dyn EmbeddingProvider>,
        scraping: Arc<dyn ScrapingBackend>,
    ) -> Self {
        let bills = InMemoryBillRepository::new();
        let links = Arc::new(InMemoryLinkRepository::new(bills.clone()));
        let bills = Arc::new(bills);
        let coordinator = BatchCoordinator::new(
            Arc::clone(&bills),
            Arc::clone(&links),
            search,
            scraping,
            Arc::new(EmbeddingCache::new(embeddings)),
        );
        Self {
            bills,
            links,
            coordinator,
        }
    }
}
