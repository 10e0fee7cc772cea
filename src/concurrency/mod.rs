//! Concurrency control for registry reads
//!
//! Manifest requests across every watched repository and tag share one
//! global semaphore, so at most `max_concurrent` of them are outstanding at
//! any instant however many pairs are configured.

pub mod orchestrator;

pub use orchestrator::{DEFAULT_MAX_CONCURRENT_FETCHES, FetchOrchestrator, FetchTask};
