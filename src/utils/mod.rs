//! Utility functions for text, URL and vector processing.
//!
//! This module provides helper functions used across the application:
//!
//! - [`url_normalizer`] - Canonical URLs used as dedup keys
//! - [`title_normalizer`] - Whitespace/Unicode normalization of bill titles
//! - [`query_builder`] - Search query derivation from bill titles
//! - [`similarity`] - Cosine similarity between embeddings
//! - [`ordered_set`] - First-seen ordered deduplication

pub mod ordered_set;
pub mod query_builder;
pub mod similarity;
pub mod title_normalizer;
pub mod url_normalizer;
