// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame source abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  Capture pipeline   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraStreamManager │  ← One live stream, acquire-then-release
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource trait  │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!      ┌─────┴──────┐
//!      ▼            ▼
//! ┌─────────┐ ┌───────────┐
//! │  Still  │ │   Test    │
//! │  image  │ │  pattern  │
//! └─────────┘ └───────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::CameraStreamManager;
pub use types::*;

use async_trait::async_trait;

/// Frame source trait
///
/// Platform camera capture plugs in here. Sources hand out a
/// [`DeviceStream`] when opened and read the current frame from it on
/// request, at native resolution and without buffering older frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Open the camera facing the given direction
    ///
    /// # Returns
    /// * `Ok(DeviceStream)` - Live stream handle
    /// * `Err(BackendError)` - Device missing or access denied
    async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream>;

    /// Read the current frame from an opened stream
    ///
    /// Must fail with `BackendError::NotReady` when the stream was stopped.
    async fn read_frame(&self, stream: &DeviceStream) -> BackendResult<PixelBuffer>;
}

/// Fail with `NotReady` unless the stream is still live
pub fn ensure_live(stream: &DeviceStream) -> BackendResult<()> {
    if stream.is_live() {
        Ok(())
    } else {
        Err(BackendError::NotReady(format!(
            "stream '{}' has been stopped",
            stream.label()
        )))
    }
}
