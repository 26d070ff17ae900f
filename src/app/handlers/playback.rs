// SPDX-License-Identifier: GPL-3.0-only

//! Review playback handlers
//!
//! A clip that fails to load, or breaks while loaded, leaves the session in
//! Reviewing with playback paused. The next tap loads it again.

use crate::app::CaptureController;
use crate::app::state::{Message, ReviewPlayback, SessionState};
use crate::app::tasks::TaskKind;
use crate::backends::camera::{BackendError, BackendResult};
use crate::errors::SessionError;
use crate::storage::ArtifactRef;
use std::time::Duration;
use tracing::{debug, info, warn};

impl CaptureController {
    /// Enter Reviewing with `artifact` loaded and playing
    pub(crate) fn begin_review(&mut self, artifact: ArtifactRef) {
        info!(path = %artifact.path.display(), "Reviewing recording");
        self.artifact = Some(artifact);
        self.state = SessionState::Reviewing;

        let started = self.load_review().and_then(|()| self.playback.play());
        self.review = match started {
            Ok(()) => Some(ReviewPlayback::Playing),
            Err(e) => {
                self.report(SessionError::PlaybackFailure(e));
                Some(ReviewPlayback::Paused {
                    offset: Duration::ZERO,
                })
            }
        };
    }

    /// Load the reviewed clip and watch it for pipeline errors
    fn load_review(&mut self) -> BackendResult<()> {
        let uri = match &self.artifact {
            Some(artifact) => artifact.uri()?,
            None => return Err(BackendError::Other("Nothing to review".into())),
        };

        self.tasks.cancel(TaskKind::Playback);
        let failure = self.playback.load(&uri)?;
        self.review_loaded = true;
        self.review_generation += 1;
        let generation = self.review_generation;
        self.tasks.spawn(TaskKind::Playback, async move {
            match failure.await {
                Ok(error) => Message::PlaybackFailed { generation, error },
                // Unloaded normally; the task is cancelled with the clip
                Err(_) => futures::future::pending().await,
            }
        });
        Ok(())
    }

    /// Unload the clip, if any
    pub(crate) fn stop_review_playback(&mut self) {
        self.tasks.cancel(TaskKind::Playback);
        self.playback.stop();
        self.review_loaded = false;
    }

    /// The loaded clip broke: unload it and wait paused for the next tap
    pub(crate) fn handle_playback_failed(&mut self, generation: u64, error: BackendError) {
        if self.state != SessionState::Reviewing || generation != self.review_generation {
            debug!(generation, "Failure of an unloaded clip ignored");
            return;
        }

        warn!(generation, %error, "Review playback failed");
        let offset = match self.review {
            Some(ReviewPlayback::Paused { offset }) => offset,
            _ => Duration::ZERO,
        };
        self.stop_review_playback();
        self.review = Some(ReviewPlayback::Paused { offset });
        self.report(SessionError::PlaybackFailure(error));
    }

    pub(crate) fn handle_discard_recording(&mut self) {
        if self.state != SessionState::Reviewing {
            debug!(state = ?self.state, "Discard ignored");
            return;
        }
        self.discard_review();
    }

    /// Reviewing -> Previewing: drop the clip and bind the preview again
    pub(crate) fn discard_review(&mut self) {
        self.stop_review_playback();
        self.review = None;
        if let Some(artifact) = self.artifact.take() {
            info!(path = %artifact.path.display(), "Recording dismissed");
        }

        self.state = SessionState::Idle;
        self.rebind_preview();
    }

    /// Tap on the media: pause remembering the offset, or resume from it
    pub(crate) fn handle_toggle_playback(&mut self) {
        if self.state != SessionState::Reviewing {
            return;
        }

        match self.review {
            Some(ReviewPlayback::Playing) => self.pause_review(),
            Some(ReviewPlayback::Paused { offset }) => {
                let loaded = if self.review_loaded {
                    Ok(())
                } else {
                    self.load_review()
                };
                let resumed = loaded
                    .and_then(|()| self.playback.seek(offset))
                    .and_then(|()| self.playback.play());
                match resumed {
                    Ok(()) => {
                        debug!(?offset, "Playback resumed");
                        self.review = Some(ReviewPlayback::Playing);
                    }
                    Err(e) => self.report(SessionError::PlaybackFailure(e)),
                }
            }
            None => {}
        }
    }

    pub(crate) fn pause_review(&mut self) {
        let offset = self.playback.position();
        match self.playback.pause() {
            Ok(()) => {
                debug!(?offset, "Playback paused");
                self.review = Some(ReviewPlayback::Paused { offset });
            }
            Err(e) => self.report(SessionError::PlaybackFailure(e)),
        }
    }
}
