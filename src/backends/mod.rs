// SPDX-License-Identifier: GPL-3.0-only

//! Frame source layer
//!
//! - [`camera`]: the `FrameSource` contract, pixel buffers and the stream manager
//! - [`virtual_camera`]: still image and test pattern sources

pub mod camera;
pub mod virtual_camera;
