//! Observed tag state and change detection
//!
//! A [`StateSnapshot`] records the last known digest of every watched
//! (repository, tag). Snapshots are compared with [`diff`] and persisted
//! between runs through a [`StateStore`].

pub mod diff;
pub mod store;

pub use diff::diff;
pub use store::{FileStateStore, MemoryStateStore, StateStore, decode_snapshot, encode_snapshot};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// repository -> tag -> digest
///
/// Example:
/// `{"library/node": {"8": "sha256:a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4"}}`
pub type StateSnapshot = BTreeMap<String, BTreeMap<String, String>>;

/// A (repository, tag) whose digest is new or differs from the previous run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Change {
    pub project: String,
    pub tag: String,
}

impl Change {
    pub fn new(project: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            tag: tag.into(),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.project, self.tag)
    }
}

/// Number of (repository, tag) entries in a snapshot
pub fn entry_count(snapshot: &StateSnapshot) -> usize {
    snapshot.values().map(BTreeMap::len).sum()
}
