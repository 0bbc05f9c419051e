//! In-process caches scoped to one pipeline run.
//!
//! - [`EmbeddingCache`] - Memoizes text embeddings shared by all bill-tasks

mod embedding_cache;

pub use embedding_cache::EmbeddingCache;
