// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate and foreground lifecycle handlers

use crate::app::CaptureController;
use crate::app::state::{Message, ReviewPlayback, SessionState};
use crate::app::tasks::TaskKind;
use crate::errors::SessionError;
use crate::permissions::PermissionStatus;
use tracing::{debug, info, warn};

impl CaptureController {
    /// Re-check permissions; bind if granted, request if not
    pub(crate) fn handle_foreground(&mut self) {
        let status = self.permissions.check(&self.required);
        info!(granted = status.satisfies(&self.required), "Foreground permission check");

        if status.satisfies(&self.required) {
            self.grant(status);
        } else {
            self.revoke(status);
            self.request_permissions();
        }
    }

    /// Pause review playback and finalize an in-flight recording
    pub(crate) fn handle_background(&mut self) {
        match self.state {
            SessionState::Recording => {
                info!("Leaving foreground while recording, stopping");
                self.stop_recording();
            }
            SessionState::Reviewing if self.review == Some(ReviewPlayback::Playing) => {
                self.pause_review();
            }
            _ => {}
        }
    }

    /// Ask for the required set; at most one request is outstanding
    pub(crate) fn request_permissions(&mut self) {
        if self.permission_request_pending {
            debug!("Permission request already pending");
            return;
        }
        self.permission_request_pending = true;

        let response = self.permissions.request(&self.required);
        self.tasks.spawn(TaskKind::Permissions, async move {
            Message::PermissionsResponded(response.await)
        });
    }

    pub(crate) fn handle_permissions_responded(&mut self, status: PermissionStatus) {
        self.permission_request_pending = false;

        if status.satisfies(&self.required) {
            info!("Permissions granted");
            self.grant(status);
        } else {
            let missing = status.missing(&self.required);
            warn!(?missing, "Permission request denied");
            self.revoke(status);

            let err = SessionError::PermissionDenied(missing);
            self.denial_notice = Some(err.to_string());
            self.report(err);
        }
    }

    fn grant(&mut self, status: PermissionStatus) {
        self.permission_status = status;
        self.denial_notice = None;

        if self.state == SessionState::Idle && !self.is_saving() {
            self.bind_preview();
        } else if self.draining.is_some() {
            debug!("Bind deferred until the interrupted recording is written");
        }
    }

    /// Drop to Idle: controls hidden, nothing bound
    ///
    /// A recording in flight is stopped but its completion is still awaited:
    /// the recorder holds the device until then.
    fn revoke(&mut self, status: PermissionStatus) {
        self.permission_status = status;

        if self.state == SessionState::Recording {
            self.pulse.cancel();
            if let Some(binding) = &self.binding
                && let Err(e) = self.camera.stop_recording(binding)
            {
                warn!(error = %e, "Failed to stop recording on permission loss");
            }
        }
        let in_flight = self.recording.take().map(|r| r.generation);
        if let Some(generation) = in_flight.or(self.finalizing.take()) {
            info!(generation, "Waiting for the interrupted recording to be written");
            self.draining = Some(generation);
        }
        self.cancel_flip();

        self.stop_review_playback();
        self.artifact = None;
        self.review = None;

        self.release_binding();
        self.state = SessionState::Idle;
    }
}
