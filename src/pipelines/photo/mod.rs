// SPDX-License-Identifier: GPL-3.0-only

//! Async photo capture pipeline
//!
//! ```text
//! Frame source → Resize → Exposure → Encode (0.85) → Upload (retry) → Record
//!  (Capturing)                       (Encoding)      (Uploading)     (Finalizing)
//! ```
//!
//! # Stages
//!
//! 1. **Capturing**: grab the current frame, fit it into the capture box,
//!    mirror front camera frames and apply the exposure bias
//! 2. **Encoding**: JPEG on the blocking pool
//! 3. **Uploading**: object storage with fixed-backoff retry
//! 4. **Finalizing**: create the photo record with the user's privacy defaults
//!
//! One capture runs at a time per orchestrator. Tearing the orchestrator
//! down (or dropping it) stops the camera stream; a capture that is still
//! capturing or encoding ends with [`PhotoError::Cancelled`], and one that
//! is already uploading may finish the upload but never writes a record.

pub mod capture;
pub mod edit;
pub mod encoding;
pub mod histogram;
pub mod processing;
pub mod upload;

pub use capture::CaptureBox;
pub use edit::EditOrchestrator;
pub use histogram::{Channel, Histogram};
pub use upload::{ProgressTracker, RetryPolicy, UploadManager, UploadTask};

use crate::backends::camera::types::{DeviceStream, FacingMode};
use crate::backends::camera::{CameraStreamManager, FrameSource};
use crate::constants;
use crate::errors::{PhotoError, PhotoResult};
use crate::records::{PhotoRecord, PhotoRepository, PreferenceSource};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Where a capture request currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    Encoding,
    Uploading,
    Finalizing,
    Succeeded,
    Failed,
}

impl CaptureState {
    /// True while a request owns the orchestrator
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            CaptureState::Capturing
                | CaptureState::Encoding
                | CaptureState::Uploading
                | CaptureState::Finalizing
        )
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::Capturing => "capturing",
            CaptureState::Encoding => "encoding",
            CaptureState::Uploading => "uploading",
            CaptureState::Finalizing => "finalizing",
            CaptureState::Succeeded => "succeeded",
            CaptureState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Parameters of one capture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureRequest {
    /// Exposure bias in -2.0..=2.0
    pub exposure: f64,
    /// Camera to open when no stream is running yet
    pub facing: FacingMode,
}

/// Collaborators a capture orchestrator works with
pub struct CaptureDeps {
    pub source: Arc<dyn FrameSource>,
    pub uploads: UploadManager,
    pub records: Arc<dyn PhotoRepository>,
    pub preferences: Arc<dyn PreferenceSource>,
    pub bounds: CaptureBox,
}

/// Drives capture requests through the state machine
pub struct CaptureOrchestrator {
    camera: CameraStreamManager,
    uploads: UploadManager,
    records: Arc<dyn PhotoRepository>,
    preferences: Arc<dyn PreferenceSource>,
    bounds: CaptureBox,
    state: watch::Sender<CaptureState>,
    torn_down: watch::Sender<bool>,
    last_outcome: Mutex<Option<PhotoResult<PhotoRecord>>>,
}

/// Resets the state to `Idle` if a capture future is dropped mid-flight
struct InFlight<'a> {
    state: &'a watch::Sender<CaptureState>,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            advance(self.state, CaptureState::Idle);
        }
    }
}

/// Move an in-flight state to `next`
///
/// Only the request that won the `Idle → Capturing` gate ever sees an
/// in-flight state, so the check doubles as an ownership test.
fn advance(state: &watch::Sender<CaptureState>, next: CaptureState) -> bool {
    state.send_if_modified(|current| {
        if current.is_in_flight() {
            *current = next;
            true
        } else {
            false
        }
    })
}

/// Return to `Idle` unless another request has already been admitted
fn reset_to_idle(state: &watch::Sender<CaptureState>) -> bool {
    state.send_if_modified(|current| {
        if current.is_in_flight() || *current == CaptureState::Idle {
            false
        } else {
            *current = CaptureState::Idle;
            true
        }
    })
}

impl CaptureOrchestrator {
    pub fn new(deps: CaptureDeps) -> Self {
        let (state, _) = watch::channel(CaptureState::Idle);
        let (torn_down, _) = watch::channel(false);

        Self {
            camera: CameraStreamManager::new(deps.source),
            uploads: deps.uploads,
            records: deps.records,
            preferences: deps.preferences,
            bounds: deps.bounds,
            state,
            torn_down,
            last_outcome: Mutex::new(None),
        }
    }

    /// Observe state transitions
    ///
    /// The channel only holds the latest state, so a slow subscriber may
    /// see `Idle` without the `Succeeded` or `Failed` before it. Read
    /// [`CaptureOrchestrator::last_outcome`] for the result of a request.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Outcome of the most recent finished capture
    pub fn last_outcome(&self) -> Option<PhotoResult<PhotoRecord>> {
        self.last_outcome.lock().ok().and_then(|o| o.clone())
    }

    /// Camera stream manager owned by this orchestrator
    pub fn camera(&self) -> &CameraStreamManager {
        &self.camera
    }

    /// Open the camera ahead of the first capture
    pub async fn start_camera(&self, facing: FacingMode) -> PhotoResult<DeviceStream> {
        if self.is_torn_down() {
            return Err(PhotoError::Cancelled);
        }
        Ok(self.camera.start(facing).await?)
    }

    /// Switch between front and back camera
    pub async fn flip_camera(&self) -> PhotoResult<DeviceStream> {
        if self.is_torn_down() {
            return Err(PhotoError::Cancelled);
        }
        Ok(self.camera.flip().await?)
    }

    pub fn is_torn_down(&self) -> bool {
        *self.torn_down.borrow()
    }

    /// Release the camera and cancel whatever capture is running
    pub fn teardown(&self) {
        if self.torn_down.send_replace(true) {
            return;
        }
        info!("Tearing down capture orchestrator");
        self.camera.stop_now(None);
    }

    /// Capture, encode, upload and record one photo
    ///
    /// Rejected with `CaptureInProgress` if another capture is running.
    pub async fn capture(
        &self,
        request: CaptureRequest,
        progress: ProgressTracker,
    ) -> PhotoResult<PhotoRecord> {
        if self.is_torn_down() {
            return Err(PhotoError::Cancelled);
        }

        let began = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = CaptureState::Capturing;
                true
            }
        });
        if !began {
            warn!("Capture requested while another capture is running");
            return Err(PhotoError::CaptureInProgress);
        }
        debug!(state = %CaptureState::Capturing, "Capture state changed");

        let mut guard = InFlight {
            state: &self.state,
            settled: false,
        };
        let result = self.run(request, progress).await;
        guard.settled = true;

        if matches!(result, Err(PhotoError::Cancelled)) {
            self.camera.stop().await;
        }
        self.settle(&result);
        result
    }

    async fn run(
        &self,
        request: CaptureRequest,
        progress: ProgressTracker,
    ) -> PhotoResult<PhotoRecord> {
        // Capturing
        let frame = self
            .until_torn_down(async {
                let stream = match self.camera.current().await {
                    Some(stream) => stream,
                    None => self.camera.start(request.facing).await?,
                };
                let frame = capture::grab_frame(
                    self.camera.source().as_ref(),
                    &stream,
                    self.bounds,
                )
                .await?;
                capture::develop(frame, stream.facing().is_mirrored(), request.exposure).await
            })
            .await?;

        // Encoding
        self.transition(CaptureState::Encoding);
        let jpeg = self
            .until_torn_down(encoding::encode(frame, constants::quality::CAPTURE))
            .await?;

        // Uploading: allowed to finish after teardown, the result is dropped
        self.transition(CaptureState::Uploading);
        let destination = upload::destination_now(constants::capture::FILE_PREFIX);
        let mut task = UploadTask::new(jpeg, destination).with_progress(progress);
        let url = self.uploads.run(&mut task).await?;

        if self.is_torn_down() {
            info!(url = %url, "Upload finished after teardown, skipping record");
            return Err(PhotoError::Cancelled);
        }

        // Finalizing
        self.transition(CaptureState::Finalizing);
        let privacy = match self.preferences.privacy_settings().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Could not load privacy settings, using defaults");
                Default::default()
            }
        };

        let record = self
            .records
            .create(PhotoRecord::new_capture(url, &privacy))
            .await
            .map_err(|e| PhotoError::MetadataWriteFailed(e.to_string()))?;
        task.finish();

        info!(
            id = %record.id,
            url = %record.image_url,
            attempts = task.attempts(),
            "Photo captured"
        );
        Ok(record)
    }

    /// Run `fut` unless the orchestrator is torn down first
    async fn until_torn_down<T>(
        &self,
        fut: impl Future<Output = PhotoResult<T>>,
    ) -> PhotoResult<T> {
        let mut torn_down = self.torn_down.subscribe();
        tokio::select! {
            biased;
            _ = torn_down.wait_for(|down| *down) => Err(PhotoError::Cancelled),
            result = fut => result,
        }
    }

    fn transition(&self, next: CaptureState) {
        if advance(&self.state, next) {
            debug!(state = %next, "Capture state changed");
        } else {
            warn!(state = %next, "Capture state no longer owned, transition skipped");
        }
    }

    fn settle(&self, result: &PhotoResult<PhotoRecord>) {
        if let Ok(mut last) = self.last_outcome.lock() {
            *last = Some(result.clone());
        }
        match result {
            Ok(_) => self.transition(CaptureState::Succeeded),
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.transition(CaptureState::Failed);
            }
        }
        if reset_to_idle(&self.state) {
            debug!(state = %CaptureState::Idle, "Capture state changed");
        }
    }
}

impl Drop for CaptureOrchestrator {
    fn drop(&mut self) {
        self.torn_down.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{BackendResult, PixelBuffer};
    use crate::backends::virtual_camera::TestPatternSource;
    use crate::records::{MemoryPhotoRepository, StaticPreferences, Visibility};
    use crate::storage::{MemoryObjectStorage, StorageError, StorageResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Source whose frames never arrive
    struct StalledSource;

    #[async_trait]
    impl FrameSource for StalledSource {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
            Ok(DeviceStream::new("stalled", facing))
        }

        async fn read_frame(&self, _stream: &DeviceStream) -> BackendResult<PixelBuffer> {
            std::future::pending().await
        }
    }

    struct BrokenPreferences;

    #[async_trait]
    impl PreferenceSource for BrokenPreferences {
        async fn privacy_settings(
            &self,
        ) -> StorageResult<Option<crate::records::PrivacySettings>> {
            Err(StorageError::Rejected("profile service down".into()))
        }
    }

    fn orchestrator(
        source: Arc<dyn FrameSource>,
        preferences: Arc<dyn PreferenceSource>,
    ) -> (CaptureOrchestrator, Arc<MemoryObjectStorage>, Arc<MemoryPhotoRepository>) {
        let storage = Arc::new(MemoryObjectStorage::new());
        let records = Arc::new(MemoryPhotoRepository::new());
        let orchestrator = CaptureOrchestrator::new(CaptureDeps {
            source,
            uploads: UploadManager::new(storage.clone(), RetryPolicy::default()),
            records: records.clone(),
            preferences,
            bounds: CaptureBox::default(),
        });
        (orchestrator, storage, records)
    }

    #[tokio::test]
    async fn test_capture_uses_fallback_privacy_when_lookup_fails() {
        let (orchestrator, _, records) = orchestrator(
            Arc::new(TestPatternSource::new(64, 48)),
            Arc::new(BrokenPreferences),
        );

        let record = orchestrator
            .capture(CaptureRequest::default(), ProgressTracker::silent())
            .await
            .unwrap();

        assert_eq!(record.visibility, Visibility::Private);
        assert!(!record.has_watermark);
        assert!(!record.allow_download);
        assert_eq!(records.list().await.unwrap().len(), 1);
        assert_eq!(orchestrator.state(), CaptureState::Idle);
        assert!(matches!(orchestrator.last_outcome(), Some(Ok(_))));
    }

    #[tokio::test]
    async fn test_second_capture_is_rejected_while_in_flight() {
        let (orchestrator, _, _) = orchestrator(
            Arc::new(StalledSource),
            Arc::new(StaticPreferences::default()),
        );

        let first = orchestrator.capture(CaptureRequest::default(), ProgressTracker::silent());
        tokio::pin!(first);

        tokio::select! {
            _ = &mut first => panic!("stalled capture finished"),
            _ = tokio::task::yield_now() => {}
        }
        assert_eq!(orchestrator.state(), CaptureState::Capturing);

        let second = orchestrator
            .capture(CaptureRequest::default(), ProgressTracker::silent())
            .await;
        assert_eq!(second.unwrap_err(), PhotoError::CaptureInProgress);
    }

    #[tokio::test]
    async fn test_late_idle_reset_leaves_next_capture_alone() {
        let (orchestrator, _, _) = orchestrator(
            Arc::new(StalledSource),
            Arc::new(StaticPreferences::default()),
        );

        // An earlier capture has reached its terminal state but not yet reset
        orchestrator.state.send_replace(CaptureState::Succeeded);

        let next = orchestrator.capture(CaptureRequest::default(), ProgressTracker::silent());
        tokio::pin!(next);
        tokio::select! {
            _ = &mut next => panic!("stalled capture finished"),
            _ = tokio::task::yield_now() => {}
        }
        assert_eq!(orchestrator.state(), CaptureState::Capturing);

        // The earlier capture's reset now runs
        assert!(!reset_to_idle(&orchestrator.state));
        assert_eq!(orchestrator.state(), CaptureState::Capturing);

        let third = orchestrator
            .capture(CaptureRequest::default(), ProgressTracker::silent())
            .await;
        assert_eq!(third.unwrap_err(), PhotoError::CaptureInProgress);
    }

    /// Source that records how many reads overlap
    #[derive(Default)]
    struct OverlapSource {
        active: AtomicU32,
        peak: AtomicU32,
    }

    #[async_trait]
    impl FrameSource for OverlapSource {
        fn name(&self) -> &str {
            "overlap"
        }

        async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
            Ok(DeviceStream::new("overlap", facing))
        }

        async fn read_frame(&self, _stream: &DeviceStream) -> BackendResult<PixelBuffer> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(PixelBuffer::filled(8, 8, [90, 120, 150, 255]))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_captures_never_overlap() {
        let source = Arc::new(OverlapSource::default());
        let (orchestrator, _, records) = orchestrator(
            source.clone(),
            Arc::new(StaticPreferences::default()),
        );
        let orchestrator = Arc::new(orchestrator);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    let mut succeeded: usize = 0;
                    for _ in 0..10 {
                        match orchestrator
                            .capture(CaptureRequest::default(), ProgressTracker::silent())
                            .await
                        {
                            Ok(_) => succeeded += 1,
                            Err(PhotoError::CaptureInProgress) => {}
                            Err(e) => panic!("unexpected capture error: {}", e),
                        }
                        tokio::task::yield_now().await;
                    }
                    succeeded
                })
            })
            .collect();

        let mut succeeded: usize = 0;
        for task in tasks {
            succeeded += task.await.unwrap();
        }

        assert_eq!(source.peak.load(Ordering::SeqCst), 1);
        assert!(succeeded > 0);
        assert_eq!(records.list().await.unwrap().len(), succeeded);
        assert_eq!(orchestrator.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_teardown_while_capturing_cancels_and_stops_stream() {
        let (orchestrator, storage, _) = orchestrator(
            Arc::new(StalledSource),
            Arc::new(StaticPreferences::default()),
        );
        let orchestrator = Arc::new(orchestrator);

        let mut states = orchestrator.subscribe();
        let task = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                orchestrator
                    .capture(CaptureRequest::default(), ProgressTracker::silent())
                    .await
            }
        });

        states
            .wait_for(|s| *s == CaptureState::Capturing)
            .await
            .unwrap();
        // Let the capture open its stream before tearing down
        while orchestrator.camera().current().await.is_none() {
            tokio::task::yield_now().await;
        }
        let stream = orchestrator.camera().current().await.unwrap();

        orchestrator.teardown();
        let result = task.await.unwrap();

        assert_eq!(result.unwrap_err(), PhotoError::Cancelled);
        assert!(!stream.is_live());
        assert_eq!(storage.upload_calls(), 0);
        assert_eq!(orchestrator.state(), CaptureState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_upload_fails_without_record() {
        let (orchestrator, storage, records) = orchestrator(
            Arc::new(TestPatternSource::new(32, 32)),
            Arc::new(StaticPreferences::default()),
        );
        storage.fail_next_uploads(u32::MAX);

        let err = orchestrator
            .capture(CaptureRequest::default(), ProgressTracker::silent())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PhotoError::UploadFailedAfterRetries { attempts: 3, .. }
        ));
        assert!(records.list().await.unwrap().is_empty());
        assert!(matches!(orchestrator.last_outcome(), Some(Err(_))));
        assert_eq!(orchestrator.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_record_write_failure_is_distinct() {
        let (orchestrator, storage, records) = orchestrator(
            Arc::new(TestPatternSource::new(32, 32)),
            Arc::new(StaticPreferences::default()),
        );
        records.reject_writes(true);

        let err = orchestrator
            .capture(CaptureRequest::default(), ProgressTracker::silent())
            .await
            .unwrap_err();

        assert!(matches!(err, PhotoError::MetadataWriteFailed(_)));
        assert_eq!(storage.len(), 1);
    }
}
