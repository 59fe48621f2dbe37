// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for photo capture and editing
//!
//! Pixel work runs on the blocking pool so the async side only waits on
//! frame acquisition, encoding and uploads.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Frame source │ ──▶ │ Capture pipeline  │ ──▶ │ Photo record │
//! │              │     │  - Resize         │     │ (filter none)│
//! │              │     │  - Exposure       │     │              │
//! │              │     │  - JPEG 0.85      │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Stored photo │ ──▶ │  Edit pipeline    │ ──▶ │ Updated      │
//! │              │     │  - Film filter    │     │ record       │
//! │              │     │  - JPEG 0.95      │     │ (edited)     │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Capture and edit orchestration with their stages

pub mod photo;
