// SPDX-License-Identifier: GPL-3.0-only

//! Capabilities the capture session drives
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             CaptureController               │
//! └──────────┬─────────────────────┬────────────┘
//!            │                     │
//! ┌──────────┴──────────┐ ┌────────┴───────────┐
//! │  CameraCapability   │ │ PlaybackCapability │
//! │ (GStreamer v4l2src) │ │ (GStreamer playbin)│
//! └─────────────────────┘ └────────────────────┘
//! ```
//!
//! - [`camera`]: preview binding per lens and clip recording
//! - [`playback`]: review of a saved clip with play/pause/seek

pub mod camera;
pub mod playback;
