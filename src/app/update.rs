// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` only routes; the handlers live in `handlers::*` grouped by domain:
//!
//! - `handlers::permissions`: foreground/background, permission gate, notice
//! - `handlers::camera`: binding and the switch-camera flip
//! - `handlers::capture`: record/stop and recording completion
//! - `handlers::playback`: review, pause/resume, discard

use super::CaptureController;
use super::state::Message;
use tracing::debug;

impl CaptureController {
    /// Apply one message to the session
    pub fn update(&mut self, message: Message) {
        debug!(?message, state = ?self.state, "Update");

        match message {
            // ===== Lifecycle =====
            Message::Foreground => self.handle_foreground(),
            Message::Background => self.handle_background(),
            Message::RequestPermissions => self.request_permissions(),
            Message::PermissionsResponded(status) => self.handle_permissions_responded(status),
            Message::DismissNotice => self.denial_notice = None,

            // ===== User input =====
            Message::ToggleRecording => self.handle_toggle_recording(),
            Message::SwitchLens => self.handle_switch_lens(),
            Message::DiscardRecording => self.handle_discard_recording(),
            Message::TogglePlayback => self.handle_toggle_playback(),

            // ===== Completions =====
            Message::LensIconSwap { generation } => self.handle_lens_icon_swap(generation),
            Message::LensFlipFinished { generation } => self.handle_lens_flip_finished(generation),
            Message::RecordingFinished { generation, result } => {
                self.handle_recording_finished(generation, result)
            }
            Message::CameraFailed { binding_id, error } => {
                self.handle_camera_failed(binding_id, error)
            }
            Message::PlaybackFailed { generation, error } => {
                self.handle_playback_failed(generation, error)
            }
        }
    }
}
