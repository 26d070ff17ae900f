// SPDX-License-Identifier: GPL-3.0-only

//! InApp Camera - preview a camera, record short clips, review the latest one
//!
//! # Architecture
//!
//! - [`app`]: capture session controller (state machine, handlers, view snapshot)
//! - [`backends`]: camera and playback capabilities with GStreamer implementations
//! - [`permissions`]: required permission set and the desktop permission source
//! - [`storage`]: recording output naming and artifact references
//! - [`config`]: user configuration
//! - [`terminal`]: terminal presentation layer
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load();
//! let (mut session, mut channels) = CaptureController::new(
//!     Capabilities {
//!         camera: Box::new(GstCamera::new(CameraSettings::from_config(&config))),
//!         playback: Box::new(GstPlayback::new()),
//!         permissions: Box::new(DevicePermissions::from_config(&config)),
//!     },
//!     SessionSettings::from_config(&config),
//! );
//! session.update(Message::Foreground);
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod permissions;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{
    Capabilities, CaptureController, DisplayRegion, Message, Notification, NotificationLevel,
    SessionChannels, SessionSettings, SessionState, ViewState,
};
pub use backends::camera::Lens;
pub use config::Config;
pub use constants::BitratePreset;
pub use errors::SessionError;
