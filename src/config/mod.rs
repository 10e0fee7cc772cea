//! Watch configuration
//!
//! The watch file is a JSON array of projects:
//!
//! ```json
//! [
//!   { "repository": "library/node", "tags": ["8", "10"], "notification": "https://example.com/hook" },
//!   { "repository": "library/alpine", "tags": "3",
//!     "notificationRequest": { "url": "https://ci.example.com/build", "method": "PUT",
//!                              "headers": { "Authorization": "Bearer ${CI_TOKEN}" } } }
//! ]
//! ```
//!
//! Templates inside `notificationRequest` are resolved once, at load time.

pub mod settings;
pub mod template;

pub use settings::CheckerConfig;
pub use template::TemplateVars;

use crate::error::{Result, WatchError};
use crate::notify::{NotificationPolicy, PolicyMatrix, RequestDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// repository -> tags to watch
pub type WatchMatrix = BTreeMap<String, Vec<String>>;

/// A single tag or a list of tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    One(String),
    Many(Vec<String>),
}

impl Tags {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Tags::One(tag) => std::slice::from_ref(tag),
            Tags::Many(tags) => tags,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Example: library/node
    pub repository: String,
    pub tags: Tags,
    /// URL that receives a POST when any of the tags changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    /// Full request descriptor, may contain `${VAR}` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchConfig {
    pub projects: Vec<Project>,
}

impl WatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WatchConfig = serde_json::from_str(json)
            .map_err(|e| WatchError::Config(format!("Invalid watch configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            WatchError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        for project in &self.projects {
            if project.repository.trim().is_empty() {
                return Err(WatchError::Config(
                    "Repository name cannot be empty".to_string(),
                ));
            }
            if project.tags.as_slice().iter().any(|t| t.trim().is_empty()) {
                return Err(WatchError::Config(format!(
                    "Empty tag configured for {}",
                    project.repository
                )));
            }
        }
        Ok(())
    }

    /// Tags to watch per repository; entries naming the same repository merge
    pub fn matrix(&self) -> WatchMatrix {
        let mut matrix = WatchMatrix::new();
        for project in &self.projects {
            let tags = matrix.entry(project.repository.clone()).or_default();
            for tag in project.tags.as_slice() {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        matrix
    }

    /// Resolve the notification policy of every configured (repository, tag).
    ///
    /// `notification` wins over `notificationRequest`. A later project entry
    /// for the same pair replaces an earlier one, including with no policy.
    pub fn policies(&self, vars: &TemplateVars) -> Result<PolicyMatrix> {
        let mut policies = PolicyMatrix::new();

        for project in &self.projects {
            let policy = self.resolve_policy(project, vars)?;
            let tags = policies.entry(project.repository.clone()).or_default();
            for tag in project.tags.as_slice() {
                match &policy {
                    Some(policy) => {
                        tags.insert(tag.clone(), policy.clone());
                    }
                    None => {
                        tags.remove(tag);
                    }
                }
            }
        }

        policies.retain(|_, tags| !tags.is_empty());
        Ok(policies)
    }

    fn resolve_policy(&self, project: &Project, vars: &TemplateVars) -> Result<Option<NotificationPolicy>> {
        if let Some(url) = &project.notification {
            return Ok(Some(NotificationPolicy::Url(url.clone())));
        }

        let Some(raw) = &project.notification_request else {
            return Ok(None);
        };

        let resolved = template::substitute_value(raw, vars);
        let descriptor: RequestDescriptor = serde_json::from_value(resolved).map_err(|e| {
            WatchError::Config(format!(
                "Invalid notificationRequest for {}: {}",
                project.repository, e
            ))
        })?;
        descriptor.validate().map_err(|e| {
            WatchError::Config(format!(
                "Invalid notificationRequest for {}: {}",
                project.repository, e
            ))
        })?;

        Ok(Some(NotificationPolicy::Request(descriptor)))
    }
}
