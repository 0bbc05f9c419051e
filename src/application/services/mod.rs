//! Pipeline services, one per stage, plus the catalog and body collectors.

pub mod batch_coordinator;
pub mod bill_catalog_service;
pub mod body_collection_service;
pub mod candidate_fetcher;
pub mod engagement_prober;
pub mod filter_chain;
pub mod persistence_gate;
pub mod resolution_service;
pub mod selector;

pub use batch_coordinator::{BatchCoordinator, BatchReport, BatchSummary, FailureReason, TaskFailure};
pub use bill_catalog_service::BillCatalogService;
pub use body_collection_service::{BodyCollectionReport, BodyCollectionService};
pub use candidate_fetcher::CandidateFetcher;
pub use engagement_prober::EngagementProber;
pub use filter_chain::{FilterChain, FilterOutcome, Rejection};
pub use persistence_gate::{GateOutcome, PersistenceGate, canonicalize_result};
pub use resolution_service::{BillOutcome, ResolutionService};
pub use selector::{Selection, select_best};
