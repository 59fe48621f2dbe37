// SPDX-License-Identifier: GPL-3.0-only

//! Pixel-level color helpers

pub mod color;
