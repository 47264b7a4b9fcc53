// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod app;
pub mod clip;
pub mod config;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod publish;
pub mod rank;
pub mod runner;

// ---- Re-exports for stable public API ----
pub use crate::clip::ClipCandidate;
pub use crate::config::PublisherConfig;
pub use crate::history::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore, PublishHistory};
pub use crate::runner::{Collaborators, ItemOutcome, RunController, RunEnd, RunSummary};
