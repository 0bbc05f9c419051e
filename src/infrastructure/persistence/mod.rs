//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx with bound parameters; the in-memory
//! variants mirror their uniqueness rules for dry runs and tests.
//!
//! # Repositories
//!
//! - [`PgBillRepository`] - Bill catalog
//! - [`PgLinkRepository`] - Resolution results and article bodies
//! - [`InMemoryBillRepository`] / [`InMemoryLinkRepository`] - Process-local stores

pub mod memory;
pub mod pg_bill_repository;
pub mod pg_link_repository;

pub use memory::{InMemoryBillRepository, InMemoryLinkRepository};
pub use pg_bill_repository::PgBillRepository;
pub use pg_link_repository::PgLinkRepository;
