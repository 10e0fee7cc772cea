//! Fan-out of manifest fetches over the (repository × tag) matrix

use crate::config::WatchMatrix;
use crate::error::{Result, WatchError};
use crate::logging::Logger;
use crate::registry::{ManifestSource, TokenCache};
use crate::status::{StateSnapshot, entry_count};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Polite default towards the public registry
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 2;

/// One manifest read, ready to run once a permit is free
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub repository: String,
    pub tag: String,
    pub token: String,
}

pub struct FetchOrchestrator {
    tokens: TokenCache,
    manifests: Arc<dyn ManifestSource>,
    max_concurrent: usize,
    output: Logger,
}

impl FetchOrchestrator {
    pub fn new(tokens: TokenCache, manifests: Arc<dyn ManifestSource>, output: Logger) -> Self {
        Self {
            tokens,
            manifests,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
            output,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetch every configured pair and assemble the new snapshot.
    ///
    /// Pairs whose token or manifest cannot be obtained are left out of the
    /// snapshot. `_previous` is unused: every pair is fetched on every run.
    pub async fn check_all(&self, matrix: &WatchMatrix, _previous: &StateSnapshot) -> StateSnapshot {
        let start_time = Instant::now();
        let tasks = self.plan(matrix).await;
        let planned = tasks.len();

        self.output.info(&format!(
            "Fetching {} manifests with {} concurrent requests",
            planned, self.max_concurrent
        ));

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let results = join_all(
            tasks
                .into_iter()
                .map(|task| self.fetch_one(task, Arc::clone(&semaphore))),
        )
        .await;

        let mut snapshot = StateSnapshot::new();
        for (task, outcome) in results {
            match outcome {
                Ok(digest) => {
                    self.output
                        .detail(&format!("{}:{} -> {}", task.repository, task.tag, digest));
                    snapshot
                        .entry(task.repository)
                        .or_default()
                        .insert(task.tag, digest);
                }
                Err(e) => self.output.warning(&e.to_string()),
            }
        }

        let fetched = entry_count(&snapshot);
        self.output.success(&format!(
            "Fetched {}/{} manifests in {}",
            fetched,
            planned,
            self.output.format_duration(start_time.elapsed())
        ));

        snapshot
    }

    /// Resolve one token per repository, then flatten into work items
    async fn plan(&self, matrix: &WatchMatrix) -> Vec<FetchTask> {
        let tokens = join_all(
            matrix
                .keys()
                .map(|repository| async move { (repository, self.tokens.get(repository).await) }),
        )
        .await;

        let mut tasks = Vec::new();
        for (repository, token) in tokens {
            match token {
                Ok(token) => {
                    tasks.extend(matrix[repository].iter().map(|tag| FetchTask {
                        repository: repository.clone(),
                        tag: tag.clone(),
                        token: token.clone(),
                    }));
                }
                Err(e) => self.output.warning(&format!(
                    "{} - skipping {} tags",
                    e,
                    matrix[repository].len()
                )),
            }
        }
        tasks
    }

    async fn fetch_one(&self, task: FetchTask, semaphore: Arc<Semaphore>) -> (FetchTask, Result<String>) {
        let outcome = match semaphore.acquire().await {
            Ok(_permit) => self
                .manifests
                .fetch_manifest(&task.token, &task.repository, &task.tag)
                .await
                .and_then(|manifest| manifest.require_digest(&task.repository, &task.tag)),
            Err(e) => Err(WatchError::ManifestFetch {
                repository: task.repository.clone(),
                tag: task.tag.clone(),
                cause: format!("Failed to acquire fetch permit: {}", e),
            }),
        };
        (task, outcome)
    }
}
