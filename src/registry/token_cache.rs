//! Per-repository bearer token cache
//!
//! One cache instance is shared by every fetch of a run. Tokens are keyed by
//! repository and reused until the expiry declared by the token server passes.
//! Concurrent misses for the same repository may each issue a token; the last
//! write wins, which is harmless because issuance is idempotent.

use crate::error::{Result, WatchError};
use crate::logging::Logger;
use crate::registry::auth::TokenSource;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// A token held by the cache for one repository
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub repository: String,
    pub token: String,
    pub expiry: Instant,
}

impl CachedToken {
    /// Valid while the expiry is strictly in the future
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expiry
    }
}

/// Thread-safe token cache; clones share the same entries
#[derive(Clone)]
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    entries: Arc<RwLock<HashMap<String, CachedToken>>>,
    output: Logger,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, output: Logger) -> Self {
        Self {
            source,
            entries: Arc::new(RwLock::new(HashMap::new())),
            output,
        }
    }

    /// Get a valid token for `repository`, issuing a new one if needed
    pub async fn get(&self, repository: &str) -> Result<String> {
        if let Some(token) = self.lookup(repository)? {
            self.output
                .detail(&format!("Reusing cached token for {}", repository));
            return Ok(token);
        }

        self.output
            .verbose(&format!("Requesting pull token for {}", repository));

        let issued = self.source.issue_token(repository).await.map_err(|e| match e {
            WatchError::Auth { .. } => e,
            other => WatchError::Auth {
                repository: repository.to_string(),
                cause: other.to_string(),
            },
        })?;

        let expiry = Instant::now()
            .checked_add(issued.expires_in)
            .ok_or_else(|| WatchError::Auth {
                repository: repository.to_string(),
                cause: format!("Token lifetime out of range: {}s", issued.expires_in.as_secs()),
            })?;

        let entry = CachedToken {
            repository: repository.to_string(),
            token: issued.token.clone(),
            expiry,
        };

        let mut guard = self.entries.write().map_err(|_| WatchError::Auth {
            repository: repository.to_string(),
            cause: "Failed to acquire token write lock".to_string(),
        })?;
        guard.insert(repository.to_string(), entry);

        self.output.detail(&format!(
            "Token for {} expires in {}s",
            repository,
            issued.expires_in.as_secs()
        ));

        Ok(issued.token)
    }

    fn lookup(&self, repository: &str) -> Result<Option<String>> {
        let guard = self.entries.read().map_err(|_| WatchError::Auth {
            repository: repository.to_string(),
            cause: "Failed to acquire token read lock".to_string(),
        })?;

        let now = Instant::now();
        Ok(guard
            .get(repository)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| entry.token.clone()))
    }

    /// Drop every cached token
    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
