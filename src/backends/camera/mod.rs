// SPDX-License-Identifier: GPL-3.0-only

//! Camera capability
//!
//! The controller only ever talks to [`CameraCapability`]. The desktop
//! implementation is [`GstCamera`], a GStreamer pipeline per lens.
//!
//! # Lifecycle
//!
//! ```text
//!   bind(lens) ──► Binding ──► start_recording ──► stop_recording
//!       ▲             │                                  │
//!       │             ▼                                  ▼
//!       └──────── unbind(Binding) ◄──── completion (Ok(ArtifactRef) / Err)
//! ```
//!
//! A recording takes over the preview stream. Once its completion has been
//! delivered the binding is spent and must be unbound before the next bind.

pub mod pipeline;
pub mod types;

pub use pipeline::GstCamera;
pub use types::*;

use crate::storage::{ArtifactRef, OutputTarget};

/// Resolves once the recording has been finalized or has failed
pub type RecordingCompletion = tokio::sync::oneshot::Receiver<BackendResult<ArtifactRef>>;

/// Preview and record operations against one lens at a time
pub trait CameraCapability: Send {
    /// Start the preview for `lens`
    ///
    /// Callers must unbind any previous [`Binding`] first; implementations may
    /// reject a second bind with [`BackendError::InitializationFailed`].
    fn bind(&mut self, lens: Lens) -> BackendResult<Binding>;

    /// Stop the preview and release the device
    fn unbind(&mut self, binding: Binding);

    /// Begin recording to `target`
    ///
    /// Returns immediately; the returned receiver yields the outcome after
    /// [`stop_recording`](Self::stop_recording), or earlier if the pipeline
    /// fails.
    fn start_recording(
        &mut self,
        binding: &Binding,
        target: OutputTarget,
    ) -> BackendResult<RecordingCompletion>;

    /// Ask the running recording to finalize
    fn stop_recording(&mut self, binding: &Binding) -> BackendResult<()>;

    /// Latest preview frames of the current binding
    fn frames(&self) -> FrameReceiver;
}
