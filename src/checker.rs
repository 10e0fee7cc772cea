//! One watch run: load state, fetch, diff, notify, save

use crate::concurrency::FetchOrchestrator;
use crate::config::{CheckerConfig, WatchMatrix};
use crate::error::Result;
use crate::logging::Logger;
use crate::notify::{DeliveryLog, Notifier, PolicyMatrix};
use crate::registry::{RegistryClient, TokenCache};
use crate::status::{Change, StateSnapshot, StateStore, diff};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a run, serialized as the process output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub changes: Vec<Change>,
    pub notifications: DeliveryLog,
    /// The new snapshot
    pub status: StateSnapshot,
}

pub struct Checker {
    orchestrator: FetchOrchestrator,
    notifier: Notifier,
    store: Arc<dyn StateStore>,
    persist: bool,
    output: Logger,
}

impl Checker {
    pub fn new(
        orchestrator: FetchOrchestrator,
        notifier: Notifier,
        store: Arc<dyn StateStore>,
        output: Logger,
    ) -> Self {
        Self {
            orchestrator,
            notifier,
            store,
            persist: true,
            output,
        }
    }

    /// Wire a checker against real registry endpoints.
    ///
    /// `tokens` is taken from the caller so it can be shared or reset between
    /// runs; pass `None` for a fresh cache.
    pub fn from_config(
        config: &CheckerConfig,
        tokens: Option<TokenCache>,
        store: Arc<dyn StateStore>,
        output: Logger,
    ) -> Result<Self> {
        config.validate()?;

        let client = Arc::new(
            RegistryClient::builder()
                .with_registry_url(config.registry_url.as_str())
                .with_token_url(config.token_url.as_str())
                .with_service(config.service.as_str())
                .with_timeout(config.timeout_secs)
                .with_output(output.clone())
                .build()?,
        );

        let tokens = tokens.unwrap_or_else(|| TokenCache::new(client.clone(), output.clone()));
        let orchestrator = FetchOrchestrator::new(tokens, client, output.clone())
            .with_max_concurrent(config.max_concurrent_fetches);
        let notifier = Notifier::new(config.timeout_secs, output.clone())?;

        Ok(Self::new(orchestrator, notifier, store, output))
    }

    /// Whether the new snapshot is saved at the end of a run
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub async fn run(&self, matrix: &WatchMatrix, policies: &PolicyMatrix) -> Result<RunReport> {
        self.output.section("Registry check");

        let previous = self.store.load().await?;
        self.output.verbose(&format!(
            "Loaded previous state for {} repositories",
            previous.len()
        ));

        let status = self.orchestrator.check_all(matrix, &previous).await;

        let changes = diff(&previous, &status);
        self.output.summary(
            "Changed tags",
            &changes.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        );

        let notifications = self.notifier.notify(&changes, policies).await;

        if self.persist {
            match self.store.save(&status).await {
                Ok(()) => self.output.step("State saved"),
                Err(e) => self.output.warning(&format!("Saving state failed: {}", e)),
            }
        } else {
            self.output.info("Dry run - state not saved");
        }

        self.output.success(&format!(
            "Run finished in {}: {} changes, {} notifications",
            self.output.format_duration(self.output.elapsed()),
            changes.len(),
            notifications.len()
        ));

        Ok(RunReport {
            changes,
            notifications,
            status,
        })
    }
}
