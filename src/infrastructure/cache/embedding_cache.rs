//! Run-scoped memoization of text embeddings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde_json::json;

use crate::domain::providers::EmbeddingProvider;
use crate::error::AppError;

/// Shared text→vector cache in front of an [`EmbeddingProvider`].
///
/// The lock is never held across the provider call. Two tasks racing on the
/// same uncached text may both compute it, but only the first stored vector is
/// ever returned, so every caller sees the same vector for the same text.
/// There is no eviction: one cache lives for one pipeline run.
pub struct EmbeddingCache {
    provider: Arc<dyn EmbeddingProvider>,
    entries: RwLock<HashMap<String, Arc<[f32]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the embedding of `text`, computing it on first access.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; nothing is cached for a failed text.
    pub async fn embed(&self, text: &str) -> Result<Arc<[f32]>, AppError> {
        if let Some(vector) = self.lookup(text)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("embedding_cache_lookups_total", "result" => "hit").increment(1);
            return Ok(vector);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("embedding_cache_lookups_total", "result" => "miss").increment(1);

        let computed: Arc<[f32]> = self.provider.embed(text).await?.into();

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let stored = entries.entry(text.to_string()).or_insert(computed);
        Ok(Arc::clone(stored))
    }

    fn lookup(&self, text: &str) -> Result<Option<Arc<[f32]>>, AppError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(text).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` since the cache was created.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

fn poisoned() -> AppError {
    AppError::internal("Embedding cache lock poisoned", json!({}))
}
