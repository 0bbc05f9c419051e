//! Application layer: the resolution pipeline and its supporting services.
//!
//! Services consume the repository and provider traits from `crate::domain`
//! and never touch a concrete client or database type.
//!
//! # Pipeline
//!
//! - [`services::CandidateFetcher`] - search query and raw candidates
//! - [`services::FilterChain`] - recency, host and similarity gates
//! - [`services::EngagementProber`] - reaction counting per survivor
//! - [`services::select_best`] - engagement floor and tie-break
//! - [`services::PersistenceGate`] - insert-if-absent write path
//! - [`services::ResolutionService`] - the above, in order, for one bill
//! - [`services::BatchCoordinator`] - bounded worker pool over many bills
//!
//! # Supporting Services
//!
//! - [`services::BillCatalogService`] - bills per year, imported on demand
//! - [`services::BodyCollectionService`] - article text for matched links

pub mod services;
