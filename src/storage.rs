// SPDX-License-Identifier: GPL-3.0-only

//! Object storage for encoded photos
//!
//! Uploads return a public URL that is later stored in the photo record and
//! handed back to [`ObjectStorage::download`] by the edit and histogram
//! paths. Two backends ship:
//!
//! - [`FsObjectStorage`]: files under a root directory, `file://` URLs
//! - [`MemoryObjectStorage`]: in-process map, `memory://` URLs

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use tracing::{debug, info};

/// Result alias for storage and record operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures reported by storage and record collaborators
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing stored under this key or URL
    #[error("not found: {0}")]
    NotFound(String),
    /// URL does not belong to this backend
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Backend refused the request
    #[error("rejected: {0}")]
    Rejected(String),
    /// Record could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob store holding encoded photos
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path` and return its public URL
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> StorageResult<String>;

    /// Fetch the bytes behind a URL returned by [`ObjectStorage::upload`]
    async fn download(&self, url: &str) -> StorageResult<Vec<u8>>;
}

/// True when `key` names something strictly below the directory it is joined to
fn stays_inside(key: &Path) -> bool {
    let mut components = key.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Reject keys that would escape the storage root
fn validate_key(path: &str) -> StorageResult<()> {
    if !stays_inside(Path::new(path)) {
        return Err(StorageError::Rejected(format!("invalid object key: {}", path)));
    }
    Ok(())
}

/// Filesystem-backed object storage
#[derive(Debug, Clone)]
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a `file://` URL (or plain path) back to a file under the root
    ///
    /// The part after the root may only hold plain names, so `..` cannot
    /// climb out of it.
    fn resolve(&self, url: &str) -> StorageResult<PathBuf> {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match path.strip_prefix(&self.root) {
            Ok(key) if stays_inside(key) => Ok(self.root.join(key)),
            _ => Err(StorageError::InvalidUrl(url.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> StorageResult<String> {
        validate_key(path)?;

        tokio::fs::create_dir_all(&self.root).await?;
        let target = self.root.join(path);
        tokio::fs::write(&target, bytes).await?;

        info!(
            path = %target.display(),
            size = bytes.len(),
            content_type,
            "Object stored"
        );
        Ok(format!("file://{}", target.display()))
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(url)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), size = bytes.len(), "Object loaded");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory object storage
///
/// Can be told to reject the next N uploads, which is how retry behavior is
/// exercised without a network.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failures_left: AtomicU32,
    upload_calls: AtomicU32,
}

impl MemoryObjectStorage {
    const SCHEME: &'static str = "memory://";

    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` uploads
    pub fn fail_next_uploads(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Upload calls seen so far, failed ones included
    pub fn upload_calls(&self) -> u32 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content type recorded for a stored URL
    pub fn content_type(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(Self::SCHEME)?;
        let objects = self.objects.lock().ok()?;
        objects.get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> StorageResult<String> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        validate_key(path)?;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::Rejected("simulated upload failure".into()));
        }

        let mut objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Rejected("storage lock poisoned".into()))?;
        objects.insert(path.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(format!("{}{}", Self::SCHEME, path))
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        let key = url
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
        let objects = self
            .objects
            .lock()
            .map_err(|_| StorageError::Rejected("storage lock poisoned".into()))?;
        objects
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}
