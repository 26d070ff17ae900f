// SPDX-License-Identifier: GPL-3.0-only

//! Session state and messages

use crate::app::animation::FlipAnimation;
use crate::backends::camera::{BackendError, BackendResult, Lens};
use crate::permissions::PermissionStatus;
use crate::storage::ArtifactRef;
use std::time::{Duration, Instant};

/// Top-level session state; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No preview: permissions missing or the camera failed to bind
    #[default]
    Idle,
    /// Live preview of the selected lens
    Previewing,
    /// Recording a clip (only entered from Previewing)
    Recording,
    /// Playing back the last saved clip
    Reviewing,
}

impl SessionState {
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Previewing => "Preview",
            SessionState::Recording => "Recording",
            SessionState::Reviewing => "Review",
        }
    }
}

/// Playback sub-state while reviewing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPlayback {
    Playing,
    /// Paused at `offset`; resuming seeks back there
    Paused { offset: Duration },
}

/// A recording in flight
#[derive(Debug, Clone)]
pub struct ActiveRecording {
    pub generation: u64,
    pub started_at: Instant,
}

/// A running switch-camera flip
#[derive(Debug, Clone)]
pub struct LensFlip {
    pub generation: u64,
    /// Lens selected once the rotation completes
    pub target: Lens,
    pub animation: FlipAnimation,
}

/// Everything that can change the session
#[derive(Debug)]
pub enum Message {
    // Lifecycle
    /// The screen came to the foreground; re-check permissions and bind if needed
    Foreground,
    /// The screen left the foreground
    Background,
    /// Ask for the required permissions again
    RequestPermissions,
    /// Response to a permission request
    PermissionsResponded(PermissionStatus),
    /// Dismiss the persistent denial notice
    DismissNotice,

    // User input
    /// Record/stop toggle
    ToggleRecording,
    /// Switch-camera toggle
    SwitchLens,
    /// Discard the reviewed recording
    DiscardRecording,
    /// Tap on the played media
    TogglePlayback,

    // Asynchronous completions
    /// Mid-rotation point of a flip: swap the switch icon
    LensIconSwap { generation: u64 },
    /// A flip rotation completed: apply the lens and rebind
    LensFlipFinished { generation: u64 },
    /// The camera finished (or failed) writing a recording
    RecordingFinished {
        generation: u64,
        result: BackendResult<ArtifactRef>,
    },
    /// The bound preview pipeline broke after it started
    CameraFailed { binding_id: u64, error: BackendError },
    /// The loaded clip broke while reviewing
    PlaybackFailed { generation: u64, error: BackendError },
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Toast-style message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
