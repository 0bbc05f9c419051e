//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and remote APIs.
//!
//! # Modules
//!
//! - [`cache`] - Run-scoped embedding cache
//! - [`clients`] - HTTP adapters for search, embeddings, scraping and bill listings
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod cache;
pub mod clients;
pub mod persistence;
