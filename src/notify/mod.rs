//! Notification delivery for changed tags
//!
//! Every change with a configured policy gets exactly one HTTP attempt. All
//! attempts run concurrently and fail independently; each produces one
//! delivery log line of the form `"<METHOD> <url> - <status or error code>"`.

use crate::error::handlers::HttpErrorHandler;
use crate::error::{Result, WatchError};
use crate::logging::Logger;
use crate::status::Change;
use futures::future::join_all;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// repository -> tag -> policy
pub type PolicyMatrix = BTreeMap<String, BTreeMap<String, NotificationPolicy>>;

/// One line per attempted notification
pub type DeliveryLog = Vec<String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationPolicy {
    /// POST with an empty body
    Url(String),
    Request(RequestDescriptor),
}

/// Fully resolved notification request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestDescriptor {
    #[serde(alias = "uri")]
    pub url: String,
    /// Defaults to GET
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Query string parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qs: BTreeMap<String, serde_json::Value>,
    /// Send `body` as JSON
    #[serde(default)]
    pub json: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    pub fn method(&self) -> Result<Method> {
        let name = self.method.as_deref().unwrap_or("GET").to_ascii_uppercase();
        Method::from_bytes(name.as_bytes())
            .map_err(|_| WatchError::Config(format!("Invalid HTTP method: {}", name)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(WatchError::Config("url cannot be empty".to_string()));
        }
        self.method().map(|_| ())
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.qs
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

pub struct Notifier {
    client: Client,
    output: Logger,
}

impl Notifier {
    pub fn new(timeout: u64, output: Logger) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            // a 3xx answer counts as delivered; never issue a second request
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("registry-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WatchError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, output))
    }

    pub fn with_client(client: Client, output: Logger) -> Self {
        Self { client, output }
    }

    /// Send one notification per change that has a policy
    pub async fn notify(&self, changes: &[Change], policies: &PolicyMatrix) -> DeliveryLog {
        let attempts: Vec<_> = changes
            .iter()
            .filter_map(|change| {
                policies
                    .get(&change.project)
                    .and_then(|tags| tags.get(&change.tag))
                    .map(|policy| (change, policy))
            })
            .collect();

        if attempts.is_empty() {
            self.output.info("No notifications to send");
            return DeliveryLog::new();
        }

        self.output
            .info(&format!("Sending {} notifications", attempts.len()));

        join_all(
            attempts
                .into_iter()
                .map(|(change, policy)| self.deliver(change, policy)),
        )
        .await
    }

    fn build(&self, policy: &NotificationPolicy) -> (Method, String, Result<RequestBuilder>) {
        match policy {
            NotificationPolicy::Url(url) => (
                Method::POST,
                url.clone(),
                Ok(self.client.post(url.as_str())),
            ),
            NotificationPolicy::Request(descriptor) => {
                let method = descriptor.method().unwrap_or(Method::GET);
                let url = descriptor.url.clone();
                let request = descriptor.method().map(|method| {
                    let mut request = self.client.request(method, url.as_str());
                    for (name, value) in &descriptor.headers {
                        request = request.header(name.as_str(), value.as_str());
                    }
                    if !descriptor.qs.is_empty() {
                        request = request.query(&descriptor.query_pairs());
                    }
                    match &descriptor.body {
                        Some(serde_json::Value::String(body)) if !descriptor.json => {
                            request.body(body.clone())
                        }
                        Some(body) => request.json(body),
                        None => request,
                    }
                });
                (method, url, request)
            }
        }
    }

    async fn deliver(&self, change: &Change, policy: &NotificationPolicy) -> String {
        let (method, url, request) = self.build(policy);

        let failure = |cause: String| WatchError::Notification {
            project: change.project.clone(),
            tag: change.tag.clone(),
            cause,
        };

        let outcome = match request {
            Ok(request) => request.send().await,
            Err(e) => {
                self.output.warning(&failure(e.to_string()).to_string());
                return format!("{} {} - EREQUEST", method, url);
            }
        };

        match outcome {
            Ok(response) => {
                let status = response.status();
                if HttpErrorHandler::is_delivered(status) {
                    self.output
                        .success(&format!("Notified {} ({} {})", change, method, url));
                } else {
                    self.output
                        .warning(&failure(format!("HTTP {}", status)).to_string());
                }
                format!("{} {} - {}", method, url, status.as_u16())
            }
            Err(e) => {
                let code = HttpErrorHandler::transport_error_code(&e);
                self.output.warning(&failure(e.to_string()).to_string());
                format!("{} {} - {}", method, url, code)
            }
        }
    }
}
