// SPDX-License-Identifier: GPL-3.0-only

//! Presentation snapshot of the session

use super::CaptureController;
use super::state::{ReviewPlayback, SessionState};
use crate::backends::camera::Lens;
use std::time::Instant;

/// What the single display region shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRegion {
    /// Nothing bound yet
    Blank,
    /// Live camera preview
    Preview,
    /// The reviewed clip
    Playback,
}

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub state: SessionState,
    pub lens: Lens,
    pub record_visible: bool,
    pub switch_visible: bool,
    pub discard_visible: bool,
    /// Record button shows "stop"
    pub recording: bool,
    pub record_opacity: f32,
    /// Switch button rotation around its vertical axis, degrees
    pub switch_rotation: f32,
    /// Lens drawn on the switch button
    pub switch_icon: Lens,
    pub display: DisplayRegion,
    pub playback_paused: bool,
    /// Persistent notice while permissions are denied
    pub denial_notice: Option<String>,
    /// A stopped recording is still being written
    pub saving: bool,
}

impl CaptureController {
    pub fn view(&self, now: Instant) -> ViewState {
        let controls = self.controls_enabled();
        let recording = self.state == SessionState::Recording;
        let saving = self.is_saving();

        let display = match self.state {
            SessionState::Idle => DisplayRegion::Blank,
            SessionState::Previewing | SessionState::Recording => DisplayRegion::Preview,
            SessionState::Reviewing => DisplayRegion::Playback,
        };

        let switch_rotation = self
            .flip
            .as_ref()
            .map(|flip| flip.animation.angle(now))
            .unwrap_or(self.switch_rotation);

        ViewState {
            state: self.state,
            lens: self.lens,
            record_visible: controls,
            switch_visible: controls && self.state == SessionState::Previewing && !saving,
            discard_visible: self.state == SessionState::Reviewing,
            recording,
            record_opacity: self.pulse.opacity(now),
            switch_rotation,
            switch_icon: self.switch_icon,
            display,
            playback_paused: matches!(self.review, Some(ReviewPlayback::Paused { .. })),
            denial_notice: self.denial_notice.clone(),
            saving,
        }
    }
}
