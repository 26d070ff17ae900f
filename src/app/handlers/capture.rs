// SPDX-License-Identifier: GPL-3.0-only

//! Video recording handlers
//!
//! The record button is a single toggle. Stopping only asks the camera to
//! finalize; the session reaches Reviewing when the completion arrives.

use crate::app::CaptureController;
use crate::app::state::{ActiveRecording, Message, Notification, SessionState};
use crate::app::tasks::TaskKind;
use crate::backends::camera::{BackendError, BackendResult};
use crate::errors::SessionError;
use crate::storage::{ArtifactRef, OutputTarget};
use std::time::Instant;
use tracing::{debug, error, info, warn};

impl CaptureController {
    pub(crate) fn handle_toggle_recording(&mut self) {
        match self.state {
            SessionState::Previewing => self.start_recording(),
            SessionState::Recording => self.stop_recording(),
            SessionState::Reviewing => {
                // Recording always starts from a live preview
                self.discard_review();
                if self.state == SessionState::Previewing {
                    self.start_recording();
                }
            }
            SessionState::Idle => debug!("Record toggle ignored while idle"),
        }
    }

    fn start_recording(&mut self) {
        if !self.controls_enabled() {
            debug!("Record toggle ignored, permissions missing");
            return;
        }
        if self.flip.is_some() {
            debug!("Record toggle ignored, lens flip running");
            return;
        }
        if self.finalizing.is_some() {
            self.notify(Notification::info("Still saving the previous video"));
            return;
        }
        let Some(binding) = self.binding.as_ref() else {
            error!("Previewing without a camera binding");
            return;
        };

        self.recording_generation += 1;
        let generation = self.recording_generation;
        let target = OutputTarget::now(&self.output_root);
        let now = Instant::now();

        self.pulse.start(now);
        match self.camera.start_recording(binding, target.clone()) {
            Ok(completion) => {
                info!(path = %target.path.display(), generation, "Recording");
                self.recording = Some(ActiveRecording {
                    generation,
                    started_at: now,
                });
                self.state = SessionState::Recording;

                self.tasks.spawn(TaskKind::Recording, async move {
                    let result = completion.await.unwrap_or_else(|_| {
                        Err(BackendError::Other("Recording ended without a result".into()))
                    });
                    Message::RecordingFinished { generation, result }
                });
            }
            Err(e) => {
                self.pulse.cancel();
                self.report(SessionError::RecordingStartFailure(e));
                // The camera may have released the preview for the recorder
                self.rebind_preview();
            }
        }
    }

    /// Recording -> Previewing; the completion decides what follows
    pub(crate) fn stop_recording(&mut self) {
        let Some(recording) = self.recording.take() else {
            return;
        };

        self.pulse.cancel();
        self.state = SessionState::Previewing;
        info!(
            generation = recording.generation,
            elapsed = ?recording.started_at.elapsed(),
            "Stopping recording"
        );

        let stopped = match self.binding.as_ref() {
            Some(binding) => self.camera.stop_recording(binding),
            None => Err(BackendError::NotBound),
        };

        match stopped {
            Ok(()) => self.finalizing = Some(recording.generation),
            Err(e) => {
                self.tasks.cancel(TaskKind::Recording);
                self.report(SessionError::RecordingSaveFailure(e));
                self.rebind_preview();
            }
        }
    }

    pub(crate) fn handle_recording_finished(
        &mut self,
        generation: u64,
        result: BackendResult<ArtifactRef>,
    ) {
        if self.draining == Some(generation) {
            self.finish_draining(generation, result);
            return;
        }

        let still_recording = self
            .recording
            .as_ref()
            .is_some_and(|r| r.generation == generation);
        if !still_recording && self.finalizing != Some(generation) {
            debug!(generation, "Stale recording completion ignored");
            return;
        }

        if still_recording {
            warn!(generation, "Recording ended before stop was requested");
            self.recording = None;
            self.pulse.cancel();
        }
        self.finalizing = None;

        // The recorder consumed the preview stream
        self.release_binding();
        self.state = SessionState::Idle;

        match result {
            Ok(artifact) => {
                self.notify(Notification::info("Video has been saved successfully."));
                self.begin_review(artifact);
            }
            Err(e) => {
                self.report(SessionError::RecordingSaveFailure(e));
                self.bind_preview();
            }
        }
    }

    /// Completion of a recording cut off by a permission loss
    ///
    /// The clip is not reviewed. The device is free again, so the preview
    /// comes back if permissions were granted in the meantime.
    fn finish_draining(&mut self, generation: u64, result: BackendResult<ArtifactRef>) {
        self.draining = None;
        match result {
            Ok(artifact) => {
                info!(generation, path = %artifact.path.display(), "Interrupted recording saved");
                self.notify(Notification::info("Video has been saved successfully."));
            }
            Err(e) => warn!(generation, error = %e, "Interrupted recording was not saved"),
        }

        if self.state == SessionState::Idle && self.controls_enabled() {
            self.bind_preview();
        }
    }
}
