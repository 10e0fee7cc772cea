//! Snapshot persistence between runs
//!
//! A snapshot travels as a single string: JSON, gzip-compressed at the best
//! level, then standard base64. An absent or empty blob is an empty snapshot.

use super::StateSnapshot;
use crate::error::{Result, WatchError};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn encode_snapshot(snapshot: &StateSnapshot) -> Result<String> {
    let json = serde_json::to_vec(snapshot)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&json)
        .map_err(|e| WatchError::Persistence(format!("Failed to compress state: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| WatchError::Persistence(format!("Failed to compress state: {}", e)))?;

    Ok(STANDARD.encode(compressed))
}

pub fn decode_snapshot(blob: &str) -> Result<StateSnapshot> {
    let blob = blob.trim();
    if blob.is_empty() {
        return Ok(StateSnapshot::new());
    }

    let compressed = STANDARD.decode(blob)?;
    let mut json = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut json)
        .map_err(|e| WatchError::Persistence(format!("Failed to decompress state: {}", e)))?;

    serde_json::from_str(&json)
        .map_err(|e| WatchError::Persistence(format!("Invalid state JSON: {}", e)))
}

/// Loads the previous snapshot at run start and saves the new one at run end
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<StateSnapshot>;
    async fn save(&self, snapshot: &StateSnapshot) -> Result<()>;
}

/// Keeps the encoded blob in a single file
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<StateSnapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => decode_snapshot(&blob),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateSnapshot::new()),
            Err(e) => Err(WatchError::Persistence(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        let blob = encode_snapshot(snapshot)?;
        tokio::fs::write(&self.path, blob).await.map_err(|e| {
            WatchError::Persistence(format!(
                "Failed to write state file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// In-process store holding the encoded blob
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &StateSnapshot) -> Result<Self> {
        let store = Self::new();
        store.replace(Some(encode_snapshot(snapshot)?))?;
        Ok(store)
    }

    /// The currently stored blob, if any
    pub fn blob(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }

    fn replace(&self, blob: Option<String>) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| WatchError::Persistence("Failed to acquire state lock".to_string()))?;
        *guard = blob;
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<StateSnapshot> {
        match self.blob() {
            Some(blob) => decode_snapshot(&blob),
            None => Ok(StateSnapshot::new()),
        }
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        self.replace(Some(encode_snapshot(snapshot)?))
    }
}
