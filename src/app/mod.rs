// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Owns the session state machine and translates user input into calls
//! against the camera and playback capabilities.
//!
//! # Architecture
//!
//! - `state`: session state, messages and notifications
//! - `update`: message dispatch
//! - `handlers`: handlers grouped by domain (permissions, camera, capture, playback)
//! - `animation`: record pulse and switch-camera flip
//! - `tasks`: session-scoped asynchronous work
//! - `view`: snapshot consumed by the presentation layer
//!
//! # Flow
//!
//! ```text
//! user input ─► Message ─► update() ─► capability call
//!                  ▲                        │
//!                  └──── SessionTasks ◄─────┘ (timers, completions)
//! ```

pub mod animation;
mod handlers;
pub mod state;
pub mod tasks;
mod update;
pub mod view;

pub use state::{Message, Notification, NotificationLevel, ReviewPlayback, SessionState};
pub use view::{DisplayRegion, ViewState};

use crate::backends::camera::pipeline::CameraSettings;
use crate::backends::camera::{Binding, CameraCapability, FrameReceiver, GstCamera, Lens};
use crate::backends::playback::{GstPlayback, PlaybackCapability};
use crate::errors::SessionError;
use crate::permissions::{
    DevicePermissions, PermissionProvider, PermissionStatus, PlatformProfile, RequiredPermissions,
};
use crate::storage::ArtifactRef;
use animation::PulseAnimation;
use state::{ActiveRecording, LensFlip};
use std::path::PathBuf;
use tasks::SessionTasks;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{error, info};

/// Capabilities the controller drives
pub struct Capabilities {
    pub camera: Box<dyn CameraCapability>,
    pub playback: Box<dyn PlaybackCapability>,
    pub permissions: Box<dyn PermissionProvider>,
}

impl Capabilities {
    /// GStreamer camera and playback with device-node permissions
    pub fn desktop(config: &crate::config::Config) -> Self {
        Self {
            camera: Box::new(GstCamera::new(CameraSettings::from_config(config))),
            playback: Box::new(GstPlayback::new()),
            permissions: Box::new(DevicePermissions::from_config(config)),
        }
    }
}

/// Values fixed for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub platform: PlatformProfile,
    pub initial_lens: Lens,
    pub output_root: PathBuf,
}

impl SessionSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            platform: PlatformProfile::new(config.platform_level),
            initial_lens: config.default_lens,
            output_root: config.output_root(),
        }
    }
}

/// Channels the presentation layer consumes
pub struct SessionChannels {
    /// Asynchronous results; feed every message back into [`CaptureController::update`]
    pub messages: UnboundedReceiver<Message>,
    /// User-facing notifications (saved, failed, denied)
    pub notifications: UnboundedReceiver<Notification>,
}

/// The capture session
///
/// Must be created inside a tokio runtime: timers and completions are
/// spawned as session-scoped tasks.
pub struct CaptureController {
    camera: Box<dyn CameraCapability>,
    playback: Box<dyn PlaybackCapability>,
    permissions: Box<dyn PermissionProvider>,
    required: RequiredPermissions,
    output_root: PathBuf,
    notifier: UnboundedSender<Notification>,
    tasks: SessionTasks,

    state: SessionState,
    lens: Lens,
    binding: Option<Binding>,

    permission_status: PermissionStatus,
    permission_request_pending: bool,
    denial_notice: Option<String>,

    recording_generation: u64,
    recording: Option<ActiveRecording>,
    /// Generation of a stopped recording whose completion is still due
    finalizing: Option<u64>,
    /// Generation of a recording cut off by a permission loss; the device
    /// stays busy until its completion arrives, so no rebind before that
    draining: Option<u64>,
    pulse: PulseAnimation,

    artifact: Option<ArtifactRef>,
    review: Option<ReviewPlayback>,
    /// Bumped on every clip load so failures of an unloaded clip are dropped
    review_generation: u64,
    /// The reviewed clip is loaded in the playback capability
    review_loaded: bool,

    flip_generation: u64,
    flip: Option<LensFlip>,
    switch_icon: Lens,
    switch_rotation: f32,
}

impl CaptureController {
    pub fn new(capabilities: Capabilities, settings: SessionSettings) -> (Self, SessionChannels) {
        let (message_tx, messages) = unbounded_channel();
        let (notifier, notifications) = unbounded_channel();
        let required = RequiredPermissions::resolve(settings.platform);

        info!(
            lens = %settings.initial_lens,
            output = %settings.output_root.display(),
            ?required,
            "Creating capture session"
        );

        let controller = Self {
            camera: capabilities.camera,
            playback: capabilities.playback,
            permissions: capabilities.permissions,
            required,
            output_root: settings.output_root,
            notifier,
            tasks: SessionTasks::new(message_tx),
            state: SessionState::Idle,
            lens: settings.initial_lens,
            binding: None,
            permission_status: PermissionStatus::default(),
            permission_request_pending: false,
            denial_notice: None,
            recording_generation: 0,
            recording: None,
            finalizing: None,
            draining: None,
            pulse: PulseAnimation::default(),
            artifact: None,
            review: None,
            review_generation: 0,
            review_loaded: false,
            flip_generation: 0,
            flip: None,
            switch_icon: settings.initial_lens,
            switch_rotation: 0.0,
        };

        (
            controller,
            SessionChannels {
                messages,
                notifications,
            },
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lens(&self) -> Lens {
        self.lens
    }

    /// The last saved clip, while it is being reviewed
    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    pub fn review(&self) -> Option<ReviewPlayback> {
        self.review
    }

    pub fn required_permissions(&self) -> &RequiredPermissions {
        &self.required
    }

    /// Whether the capture controls are enabled (every permission granted)
    pub fn controls_enabled(&self) -> bool {
        self.permission_status.satisfies(&self.required)
    }

    /// A stopped recording is still being written
    pub fn is_finalizing(&self) -> bool {
        self.finalizing.is_some()
    }

    /// Some recording, stopped or cut off, has not been written yet
    fn is_saving(&self) -> bool {
        self.finalizing.is_some() || self.draining.is_some()
    }

    pub fn camera_frames(&self) -> FrameReceiver {
        self.camera.frames()
    }

    pub fn playback_frames(&self) -> FrameReceiver {
        self.playback.frames()
    }

    /// Send a notification to the presentation layer
    fn notify(&self, notification: Notification) {
        let _ = self.notifier.send(notification);
    }

    /// Log a session error and surface it on the notification channel
    fn report(&self, err: SessionError) {
        error!(error = %err, "Session error");
        self.notify(Notification::error(err.to_string()));
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.playback.stop();
        if let Some(binding) = self.binding.take() {
            self.camera.unbind(binding);
        }
    }
}
