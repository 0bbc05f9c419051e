//! Domain layer containing business entities and collaborator contracts.
//!
//! This module is independent of infrastructure concerns: it defines the data
//! the pipeline works on and the traits every external system is reached through.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`providers`] - Search, embedding, scraping and bill-source contracts
//! - [`progress`] - Per-bill task states, progress events and the stop signal
//!
//! # Resolution Flow
//!
//! 1. [`crate::application::services::BatchCoordinator`] queues bill-tasks
//! 2. Each task runs fetch → filter → probe → select → persist sequentially
//! 3. Every state transition is emitted as a [`progress::ProgressEvent`]
//! 4. The result is written through [`repositories::LinkRepository`]

pub mod entities;
pub mod progress;
pub mod providers;
pub mod repositories;
