//! Repository trait definitions for the domain layer.
//!
//! This module defines the repository interfaces (traits) that abstract data access
//! operations following the Repository pattern. These traits are implemented by
//! concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`BillRepository`] - Bill catalog keyed by `(year, normalized title)`
//! - [`LinkRepository`] - Insert-if-absent resolution results
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod bill_repository;
pub mod link_repository;

pub use bill_repository::BillRepository;
pub use link_repository::{LinkCounts, LinkRepository};

#[cfg(test)]
pub use bill_repository::MockBillRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
