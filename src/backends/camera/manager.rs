// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream lifecycle manager
//!
//! The manager provides:
//! - At most one live device stream at a time
//! - Stop-before-start when switching cameras
//! - Stream release when the manager is dropped

use super::FrameSource;
use super::types::*;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Owner of the single camera stream used by an orchestrator
pub struct CameraStreamManager {
    source: Arc<dyn FrameSource>,
    stream: Mutex<Option<DeviceStream>>,
}

impl CameraStreamManager {
    /// Create a manager with no stream opened yet
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        info!(source = source.name(), "Creating camera stream manager");

        Self {
            source,
            stream: Mutex::new(None),
        }
    }

    /// Frame source this manager opens streams on
    pub fn source(&self) -> Arc<dyn FrameSource> {
        Arc::clone(&self.source)
    }

    /// Start a stream on the given camera
    ///
    /// Any previous stream is stopped before the new one is opened, so two
    /// devices are never held at once. If opening fails the manager is left
    /// without a stream.
    pub async fn start(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
        let mut slot = self.stream.lock().await;

        if let Some(previous) = slot.take() {
            debug!(stream = previous.label(), "Stopping previous stream");
            previous.stop();
        }

        let stream = self.source.open(facing).await?;
        info!(
            stream = stream.label(),
            facing = %facing,
            "Camera stream started"
        );

        *slot = Some(stream.clone());
        Ok(stream)
    }

    /// Switch to the opposite camera
    pub async fn flip(&self) -> BackendResult<DeviceStream> {
        let facing = self
            .current()
            .await
            .map(|stream| stream.facing())
            .unwrap_or_default()
            .flipped();

        info!(facing = %facing, "Flipping camera");
        self.start(facing).await
    }

    /// Live stream, if one is running
    pub async fn current(&self) -> Option<DeviceStream> {
        self.stream
            .lock()
            .await
            .as_ref()
            .filter(|stream| stream.is_live())
            .cloned()
    }

    /// Stop the current stream, if any
    pub async fn stop(&self) {
        if let Some(stream) = self.stream.lock().await.take()
            && stream.stop()
        {
            info!(stream = stream.label(), "Camera stream stopped");
        }
    }

    /// Stop the current stream without waiting for the lock
    ///
    /// Used on teardown paths that cannot await. The stream flag is shared,
    /// so stopping a clone is enough to release the device.
    pub(crate) fn stop_now(&self, known: Option<&DeviceStream>) {
        if let Some(stream) = known {
            stream.stop();
        }
        if let Ok(mut slot) = self.stream.try_lock()
            && let Some(stream) = slot.take()
        {
            stream.stop();
        }
    }
}

impl Drop for CameraStreamManager {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.get_mut().take()
            && stream.stop()
        {
            debug!(stream = stream.label(), "Camera stream released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Source that remembers every stream it opened
    #[derive(Default)]
    struct RecordingSource {
        opened: StdMutex<Vec<DeviceStream>>,
    }

    #[async_trait]
    impl FrameSource for RecordingSource {
        fn name(&self) -> &str {
            "recording"
        }

        async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
            let stream = DeviceStream::new(format!("cam-{}", facing), facing);
            self.opened.lock().unwrap().push(stream.clone());
            Ok(stream)
        }

        async fn read_frame(&self, stream: &DeviceStream) -> BackendResult<PixelBuffer> {
            super::super::ensure_live(stream)?;
            Ok(PixelBuffer::filled(2, 2, [0, 0, 0, 255]))
        }
    }

    #[tokio::test]
    async fn test_flip_stops_previous_stream() {
        let source = Arc::new(RecordingSource::default());
        let manager = CameraStreamManager::new(source.clone());

        let back = manager.start(FacingMode::Environment).await.unwrap();
        let front = manager.flip().await.unwrap();

        assert!(!back.is_live());
        assert!(front.is_live());
        assert_eq!(front.facing(), FacingMode::User);

        let live = source
            .opened
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_live())
            .count();
        assert_eq!(live, 1);
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let source = Arc::new(RecordingSource::default());
        let manager = CameraStreamManager::new(source);
        let stream = manager.start(FacingMode::Environment).await.unwrap();

        drop(manager);
        assert!(!stream.is_live());
    }

    #[tokio::test]
    async fn test_current_ignores_stopped_stream() {
        let manager = CameraStreamManager::new(Arc::new(RecordingSource::default()));
        let stream = manager.start(FacingMode::User).await.unwrap();
        stream.stop();
        assert!(manager.current().await.is_none());
    }
}
