//! Authentication module for Docker registry access

use crate::error::{Result, WatchError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Lifetime assumed when the token server omits `expires_in`
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60);

/// Body returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    /// Example: 2018-10-18T17:22:55.893319601Z
    pub issued_at: Option<String>,
}

/// A freshly issued bearer token and its declared time-to-live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: Duration,
    pub issued_at: Option<String>,
}

impl TokenResponse {
    pub fn into_issued(self, repository: &str) -> Result<IssuedToken> {
        let token = self
            .token
            .or(self.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WatchError::Auth {
                repository: repository.to_string(),
                cause: "token response carried no token".to_string(),
            })?;

        Ok(IssuedToken {
            token,
            expires_in: self
                .expires_in
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOKEN_TTL),
            issued_at: self.issued_at,
        })
    }
}

/// Issues pull-scoped bearer tokens for a repository
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn issue_token(&self, repository: &str) -> Result<IssuedToken>;
}

/// Pull-only scope for a repository, e.g. `repository:library/node:pull`
pub fn pull_scope(repository: &str) -> String {
    format!("repository:{}:pull", repository)
}
