// SPDX-License-Identifier: GPL-3.0-only

//! Photo records and user preferences
//!
//! The pipeline writes only a handful of record fields: the image URLs, the
//! applied filter, the edited flag and the camera settings. Sharing fields
//! come from the user's privacy preferences at creation time and are left
//! alone afterwards.

use crate::constants::camera_settings;
use crate::filters::NONE_ID;
use crate::storage::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Who can see a photo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Friends,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Friends => write!(f, "friends"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "friends" => Ok(Visibility::Friends),
            "public" => Ok(Visibility::Public),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// Per-user defaults applied to new photos
///
/// Every field falls back independently, so a partial settings object
/// still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub default_photo_visibility: Visibility,
    pub watermark_photos: bool,
    pub allow_downloads: bool,
}

/// Exposure settings recorded with a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub iso: String,
    pub aperture: String,
    pub shutter_speed: String,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            iso: camera_settings::ISO.to_string(),
            aperture: camera_settings::APERTURE.to_string(),
            shutter_speed: camera_settings::SHUTTER_SPEED.to_string(),
        }
    }
}

/// One access to a shared photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Stored metadata for one photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "file_url")]
    pub image_url: String,
    pub thumbnail_url: String,
    pub filter_applied: String,
    pub edited: bool,
    pub camera_settings: CameraSettings,
    pub visibility: Visibility,
    pub has_watermark: bool,
    pub allow_download: bool,
    #[serde(default)]
    pub access_log: Vec<AccessLogEntry>,
}

impl PhotoRecord {
    /// Record for a fresh, unfiltered capture
    pub fn new_capture(image_url: impl Into<String>, privacy: &PrivacySettings) -> Self {
        let image_url = image_url.into();
        Self {
            id: Uuid::new_v4(),
            title: format!("Photo {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
            created_at: Utc::now(),
            thumbnail_url: image_url.clone(),
            image_url,
            filter_applied: NONE_ID.to_string(),
            edited: false,
            camera_settings: CameraSettings::default(),
            visibility: privacy.default_photo_visibility,
            has_watermark: privacy.watermark_photos,
            allow_download: privacy.allow_downloads,
            access_log: Vec::new(),
        }
    }
}

/// Partial update of the pipeline-owned fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoUpdate {
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub filter_applied: Option<String>,
    pub edited: Option<bool>,
}

impl PhotoUpdate {
    /// Update written after an edit has been stored at `url`
    pub fn edited(url: impl Into<String>, filter_id: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            thumbnail_url: Some(url.clone()),
            image_url: Some(url),
            filter_applied: Some(filter_id.into()),
            edited: Some(true),
        }
    }

    pub fn apply_to(&self, record: &mut PhotoRecord) {
        if let Some(url) = &self.image_url {
            record.image_url = url.clone();
        }
        if let Some(url) = &self.thumbnail_url {
            record.thumbnail_url = url.clone();
        }
        if let Some(filter) = &self.filter_applied {
            record.filter_applied = filter.clone();
        }
        if let Some(edited) = self.edited {
            record.edited = edited;
        }
    }
}

/// Photo metadata store
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, record: PhotoRecord) -> StorageResult<PhotoRecord>;

    async fn get(&self, id: Uuid) -> StorageResult<Option<PhotoRecord>>;

    async fn update(&self, id: Uuid, update: PhotoUpdate) -> StorageResult<PhotoRecord>;

    /// All records, newest first
    async fn list(&self) -> StorageResult<Vec<PhotoRecord>>;
}

fn newest_first(records: &mut [PhotoRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryPhotoRepository {
    records: Mutex<Vec<PhotoRecord>>,
    reject_writes: AtomicBool,
}

impl MemoryPhotoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following create and update fail
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected("record store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoRepository for MemoryPhotoRepository {
    async fn create(&self, record: PhotoRecord) -> StorageResult<PhotoRecord> {
        self.check_writable()?;
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<PhotoRecord>> {
        Ok(self.records.lock().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: Uuid, update: PhotoUpdate) -> StorageResult<PhotoRecord> {
        self.check_writable()?;
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn list(&self) -> StorageResult<Vec<PhotoRecord>> {
        let mut records = self.records.lock().await.clone();
        newest_first(&mut records);
        Ok(records)
    }
}

/// Record store kept in a single JSON file
///
/// The whole file is rewritten on every change through a sibling temp
/// file, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct JsonPhotoRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPhotoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StorageResult<Vec<PhotoRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, records: &[PhotoRecord]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = records.len(), "Records saved");
        Ok(())
    }
}

#[async_trait]
impl PhotoRepository for JsonPhotoRepository {
    async fn create(&self, record: PhotoRecord) -> StorageResult<PhotoRecord> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.push(record.clone());
        self.store(&records).await?;
        info!(id = %record.id, "Photo record created");
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<PhotoRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    async fn update(&self, id: Uuid, update: PhotoUpdate) -> StorageResult<PhotoRecord> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        update.apply_to(record);
        let updated = record.clone();
        self.store(&records).await?;
        info!(id = %id, "Photo record updated");
        Ok(updated)
    }

    async fn list(&self) -> StorageResult<Vec<PhotoRecord>> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        newest_first(&mut records);
        Ok(records)
    }
}

/// Source of the current user's privacy preferences
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    /// `Ok(None)` when the user never saved any settings
    async fn privacy_settings(&self) -> StorageResult<Option<PrivacySettings>>;
}

/// Preferences fixed at construction, e.g. from the local config file
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences(pub Option<PrivacySettings>);

#[async_trait]
impl PreferenceSource for StaticPreferences {
    async fn privacy_settings(&self) -> StorageResult<Option<PrivacySettings>> {
        Ok(self.0.clone())
    }
}
