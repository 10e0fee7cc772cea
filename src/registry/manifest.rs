//! Schema 1 image manifest as returned by `GET /v2/{name}/manifests/{tag}`

use crate::error::{Result, WatchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsLayer {
    #[serde(rename = "blobSum")]
    pub blob_sum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub schema_version: u32,
    /// Example: library/node
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub architecture: String,
    /// Ordered base-first
    #[serde(default)]
    pub fs_layers: Vec<FsLayer>,
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
}

impl Manifest {
    /// Fingerprint of the tag: the blobSum of the last layer record
    pub fn digest(&self) -> Option<&str> {
        self.fs_layers.last().map(|layer| layer.blob_sum.as_str())
    }

    /// Same as [`Manifest::digest`] but a missing layer list is a fetch failure
    pub fn require_digest(&self, repository: &str, tag: &str) -> Result<String> {
        self.digest()
            .map(str::to_string)
            .ok_or_else(|| WatchError::ManifestFetch {
                repository: repository.to_string(),
                tag: tag.to_string(),
                cause: "manifest has no fsLayers".to_string(),
            })
    }
}

/// Retrieves the manifest of one (repository, tag) with a bearer token
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch_manifest(&self, token: &str, repository: &str, tag: &str) -> Result<Manifest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "schemaVersion": 1,
        "name": "library/node",
        "tag": "8",
        "architecture": "amd64",
        "fsLayers": [
            {"blobSum": "sha256:base"},
            {"blobSum": "sha256:middle"},
            {"blobSum": "sha256:top"}
        ],
        "history": [{"v1Compatibility": "{}"}]
    }"#;

    #[test]
    fn test_digest_is_last_layer() {
        let manifest: Manifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.name, "library/node");
        assert_eq!(manifest.tag, "8");
        assert_eq!(manifest.digest(), Some("sha256:top"));
    }

    #[test]
    fn test_empty_layers_fail() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"schemaVersion":1,"name":"library/node","tag":"8","fsLayers":[]}"#)
                .unwrap();
        assert!(manifest.digest().is_none());
        assert!(matches!(
            manifest.require_digest("library/node", "8"),
            Err(WatchError::ManifestFetch { .. })
        ));
    }
}
