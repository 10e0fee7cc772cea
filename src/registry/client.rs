//! Registry client for token issuance and manifest retrieval
//!
//! `RegistryClient` talks to two hosts: the token server that issues
//! pull-scoped bearer tokens and the registry that serves manifests.

use crate::error::handlers::HttpErrorHandler;
use crate::error::{Result, WatchError};
use crate::logging::Logger;
use crate::registry::auth::{IssuedToken, TokenResponse, TokenSource, pull_scope};
use crate::registry::manifest::{Manifest, ManifestSource};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry-1.docker.io";
pub const DEFAULT_TOKEN_URL: &str = "https://auth.docker.io/token";
pub const DEFAULT_SERVICE: &str = "registry.docker.io";

const MANIFEST_ACCEPT: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws, application/vnd.docker.distribution.manifest.v1+json, application/json";

pub struct RegistryClientBuilder {
    registry_url: String,
    token_url: String,
    service: String,
    timeout: u64,
    output: Logger,
}

impl RegistryClientBuilder {
    pub fn new() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            timeout: 30,
            output: Logger::default(),
        }
    }

    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = registry_url.into();
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        // Fail early on unusable endpoints
        Url::parse(&self.registry_url)?;
        Url::parse(&self.token_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .user_agent(concat!("registry-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WatchError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(RegistryClient {
            client,
            registry_url: self.registry_url.trim_end_matches('/').to_string(),
            token_url: self.token_url,
            service: self.service,
            output: self.output,
        })
    }
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RegistryClient {
    client: Client,
    registry_url: String,
    token_url: String,
    service: String,
    output: Logger,
}

impl RegistryClient {
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    pub fn manifest_url(&self, repository: &str, tag: &str) -> String {
        format!("{}/v2/{}/manifests/{}", self.registry_url, repository, tag)
    }

    fn token_request_url(&self, repository: &str) -> Result<Url> {
        let scope = pull_scope(repository);
        Ok(Url::parse_with_params(
            &self.token_url,
            &[("service", self.service.as_str()), ("scope", scope.as_str())],
        )?)
    }

    async fn request_token(&self, repository: &str) -> Result<IssuedToken> {
        let url = self.token_request_url(repository)?;
        self.output.detail(&format!("Requesting token from: {}", url));

        let auth_failure = |cause: String| WatchError::Auth {
            repository: repository.to_string(),
            cause,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| auth_failure(format!("Failed to get auth token: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(auth_failure(HttpErrorHandler::describe_auth_error(
                status,
                &error_text,
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_failure(format!("Failed to parse token response: {}", e)))?;

        body.into_issued(repository)
    }

    async fn request_manifest(&self, token: &str, repository: &str, tag: &str) -> Result<Manifest> {
        let url = self.manifest_url(repository, tag);
        self.output.detail(&format!("GET {}", url));

        let fetch_failure = |cause: String| WatchError::ManifestFetch {
            repository: repository.to_string(),
            tag: tag.to_string(),
            cause,
        };

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, MANIFEST_ACCEPT)
            .send()
            .await
            .map_err(|e| fetch_failure(format!("Failed to request manifest: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(fetch_failure(HttpErrorHandler::describe_registry_error(
                status,
                &error_text,
                "manifest retrieval",
            )));
        }

        response
            .json::<Manifest>()
            .await
            .map_err(|e| fetch_failure(format!("Failed to parse manifest: {}", e)))
    }
}

#[async_trait]
impl TokenSource for RegistryClient {
    async fn issue_token(&self, repository: &str) -> Result<IssuedToken> {
        self.request_token(repository).await
    }
}

#[async_trait]
impl ManifestSource for RegistryClient {
    async fn fetch_manifest(&self, token: &str, repository: &str, tag: &str) -> Result<Manifest> {
        self.request_manifest(token, repository, tag).await
    }
}
