// SPDX-License-Identifier: GPL-3.0-only

//! Playback capability used to review the last recording

pub mod pipeline;

pub use pipeline::GstPlayback;

use crate::backends::camera::{BackendResult, FrameReceiver, PipelineFailure};
use std::time::Duration;

/// Renders a stored clip with play/pause/seek
pub trait PlaybackCapability: Send {
    /// Load the clip at `uri`, replacing whatever was loaded
    ///
    /// Waits until the clip is prerolled. The returned receiver yields the
    /// first error the clip hits while loaded.
    fn load(&mut self, uri: &str) -> BackendResult<PipelineFailure>;

    fn play(&mut self) -> BackendResult<()>;

    fn pause(&mut self) -> BackendResult<()>;

    fn seek(&mut self, position: Duration) -> BackendResult<()>;

    /// Current playback offset; zero when nothing is loaded
    fn position(&self) -> Duration;

    /// Unload the clip and release the pipeline
    fn stop(&mut self);

    /// Latest rendered frames
    fn frames(&self) -> FrameReceiver;
}
