//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without I/O.
//!
//! # Entity Types
//!
//! - [`Bill`] / [`BillTitle`] - A legislative bill, identified by `(year, normalized title)`
//! - [`Candidate`] / [`ProbedCandidate`] - Transient news articles under evaluation
//! - [`ResolutionResult`] - Match or NoMatch for one bill
//! - [`NewsLink`] - The persisted bill→article record (or NoMatch sentinel)
//!
//! # Design Pattern
//!
//! Persisted entities have separate structs for creation (`NewBill`, `NewNewsLink`).

pub mod bill;
pub mod candidate;
pub mod news_link;

pub use bill::{Bill, BillTitle, NewBill};
pub use candidate::{Candidate, ProbedCandidate, parse_published_at};
pub use news_link::{
    InsertOutcome, NO_MATCH_TITLE, NO_MATCH_URL, NewNewsLink, NewsLink, ResolutionResult,
};
