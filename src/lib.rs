//! Registry Notify Library
//!
//! Watches a set of Docker registry repositories and tags, detects when the
//! top layer digest of a tag changes between runs and fires the configured
//! HTTP notifications for every change.

pub mod checker;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod registry;
pub mod status;

pub use checker::{Checker, RunReport};
pub use error::{Result, WatchError};
pub use logging::Logger;
