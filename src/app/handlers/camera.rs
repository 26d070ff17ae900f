// SPDX-License-Identifier: GPL-3.0-only

//! Camera binding and lens switching handlers
//!
//! The binding is torn down before every new bind, and a lens switch only
//! rebinds once the flip rotation has completed. A preview that breaks after
//! binding drops the session to Idle; the next foreground binds again.

use crate::app::CaptureController;
use crate::app::animation::FlipAnimation;
use crate::app::state::{LensFlip, Message, Notification, SessionState};
use crate::app::tasks::TaskKind;
use crate::backends::camera::{BackendError, Lens};
use crate::constants::timing::{LENS_FLIP_ANGLE, LENS_FLIP_DURATION, LENS_ICON_SWAP_DELAY};
use crate::errors::SessionError;
use std::time::Instant;
use tracing::{debug, info, warn};

impl CaptureController {
    /// Bind the current lens; Previewing on success, Idle on failure
    pub(crate) fn bind_preview(&mut self) {
        if self.binding.is_some() {
            // Never two binds at once
            self.release_binding();
        }

        match self.camera.bind(self.lens) {
            Ok(mut binding) => {
                info!(lens = %self.lens, "Preview started");
                if let Some(failure) = binding.take_failure() {
                    let binding_id = binding.id();
                    self.tasks.spawn(TaskKind::Camera, async move {
                        match failure.await {
                            Ok(error) => Message::CameraFailed { binding_id, error },
                            // Unbound normally; the task is cancelled with the binding
                            Err(_) => futures::future::pending().await,
                        }
                    });
                }
                self.binding = Some(binding);
                self.state = SessionState::Previewing;
            }
            Err(e) => {
                self.state = SessionState::Idle;
                self.report(SessionError::CapabilityBindFailure(e));
            }
        }
    }

    pub(crate) fn release_binding(&mut self) {
        self.tasks.cancel(TaskKind::Camera);
        if let Some(binding) = self.binding.take() {
            self.camera.unbind(binding);
        }
    }

    /// The preview pipeline broke: unbind and wait for the next foreground
    pub(crate) fn handle_camera_failed(&mut self, binding_id: u64, error: BackendError) {
        if self.binding.as_ref().map(|b| b.id()) != Some(binding_id) {
            debug!(binding_id, "Failure of a released binding ignored");
            return;
        }
        if self.state != SessionState::Previewing {
            // A recording reports through its own completion
            debug!(state = ?self.state, %error, "Preview failure ignored");
            return;
        }

        warn!(binding_id, %error, "Preview failed");
        self.cancel_flip();
        self.release_binding();
        self.state = SessionState::Idle;
        self.report(SessionError::CapabilityBindFailure(error));
    }

    /// Unbind, then bind again with the current lens
    pub(crate) fn rebind_preview(&mut self) {
        self.release_binding();
        self.bind_preview();
    }

    pub(crate) fn handle_switch_lens(&mut self) {
        match self.state {
            SessionState::Recording => {
                warn!("Lens switch rejected while recording");
                self.notify(Notification::info("Cannot switch camera while recording"));
            }
            SessionState::Previewing if self.flip.is_some() => {
                debug!("Lens switch ignored, flip already running");
            }
            SessionState::Previewing if self.finalizing.is_some() => {
                debug!("Lens switch ignored, recording still being saved");
            }
            SessionState::Previewing => self.start_flip(),
            SessionState::Idle | SessionState::Reviewing => {
                debug!(state = ?self.state, "Lens switch ignored");
            }
        }
    }

    fn start_flip(&mut self) {
        self.flip_generation += 1;
        let generation = self.flip_generation;
        let target = self.lens.flipped();

        // Leaving the front lens rotates 180 -> 0, leaving the back lens 0 -> 180
        let (from, to) = match self.lens {
            Lens::Front => (LENS_FLIP_ANGLE, 0.0),
            Lens::Back => (0.0, LENS_FLIP_ANGLE),
        };

        info!(from = %self.lens, to = %target, generation, "Flipping lens");
        self.flip = Some(LensFlip {
            generation,
            target,
            animation: FlipAnimation::new(from, to, Instant::now()),
        });

        self.tasks.delay(
            TaskKind::Lens,
            LENS_ICON_SWAP_DELAY,
            Message::LensIconSwap { generation },
        );
        self.tasks.delay(
            TaskKind::Lens,
            LENS_FLIP_DURATION,
            Message::LensFlipFinished { generation },
        );
    }

    pub(crate) fn handle_lens_icon_swap(&mut self, generation: u64) {
        if let Some(flip) = self.flip.as_ref().filter(|f| f.generation == generation) {
            self.switch_icon = flip.target;
        }
    }

    pub(crate) fn handle_lens_flip_finished(&mut self, generation: u64) {
        let Some(flip) = self.flip.take_if(|f| f.generation == generation) else {
            debug!(generation, "Stale flip completion ignored");
            return;
        };

        self.switch_rotation = flip.animation.end_angle();
        self.switch_icon = flip.target;
        self.lens = flip.target;
        info!(lens = %self.lens, "Lens switched");

        if self.state == SessionState::Previewing {
            self.rebind_preview();
        }
    }

    /// Abort a running flip; the lens stays as it was
    pub(crate) fn cancel_flip(&mut self) {
        self.tasks.cancel(TaskKind::Lens);
        if self.flip.take().is_some() {
            self.switch_icon = self.lens;
        }
    }
}
