// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer playback capability (`playbin` rendering into an RGB appsink)

use super::PlaybackCapability;
use crate::backends::camera::pipeline::{
    PREVIEW_SINK, attach_frame_sink, preview_sink_description, start_pipeline, watch_for_failure,
};
use crate::backends::camera::{
    BackendError, BackendResult, FrameReceiver, FrameSender, PipelineFailure, frame_slot,
};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Playback capability backed by `playbin`
pub struct GstPlayback {
    frames: Arc<FrameSender>,
    receiver: FrameReceiver,
    playbin: Option<gst::Pipeline>,
}

impl GstPlayback {
    pub fn new() -> Self {
        let (frames, receiver) = frame_slot();
        Self {
            frames: Arc::new(frames),
            receiver,
            playbin: None,
        }
    }

    fn playbin(&self) -> BackendResult<&gst::Pipeline> {
        self.playbin
            .as_ref()
            .ok_or_else(|| BackendError::Other("No clip loaded".into()))
    }

    fn set_state(&self, state: gst::State) -> BackendResult<()> {
        self.playbin()?
            .set_state(state)
            .map(|_| ())
            .map_err(|e| BackendError::Pipeline(format!("Failed to set {:?}: {}", state, e)))
    }
}

impl Default for GstPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackCapability for GstPlayback {
    fn load(&mut self, uri: &str) -> BackendResult<PipelineFailure> {
        self.stop();
        gst::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        let sink_bin = gst::parse::bin_from_description(&preview_sink_description(true), true)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        let appsink = sink_bin
            .by_name(PREVIEW_SINK)
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| BackendError::InitializationFailed("Playback sink missing".into()))?;
        attach_frame_sink(&appsink, Arc::clone(&self.frames));

        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", uri)
            .property("video-sink", &sink_bin)
            .build()
            .map_err(|e| BackendError::InitializationFailed(format!("playbin: {}", e)))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("playbin is not a pipeline".into()))?;

        // Preroll so seeking works before the first play
        let failure = match start_pipeline(&playbin, gst::State::Paused)
            .and_then(|()| watch_for_failure(&playbin, "playback-bus"))
        {
            Ok(failure) => failure,
            Err(e) => {
                let _ = playbin.set_state(gst::State::Null);
                error!(%uri, error = %e, "Clip failed to load");
                return Err(e);
            }
        };

        info!(%uri, "Clip loaded");
        self.playbin = Some(playbin);
        Ok(failure)
    }

    fn play(&mut self) -> BackendResult<()> {
        debug!("Playback resumed");
        self.set_state(gst::State::Playing)
    }

    fn pause(&mut self) -> BackendResult<()> {
        debug!("Playback paused");
        self.set_state(gst::State::Paused)
    }

    fn seek(&mut self, position: Duration) -> BackendResult<()> {
        let target = gst::ClockTime::from_nseconds(position.as_nanos() as u64);
        self.playbin()?
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE, target)
            .map_err(|e| BackendError::Pipeline(format!("Seek failed: {}", e)))
    }

    fn position(&self) -> Duration {
        self.playbin
            .as_ref()
            .and_then(|p| p.query_position::<gst::ClockTime>())
            .map(|t| Duration::from_nanos(t.nseconds()))
            .unwrap_or_default()
    }

    fn stop(&mut self) {
        if let Some(playbin) = self.playbin.take() {
            let _ = playbin.set_state(gst::State::Null);
            self.frames.send_replace(None);
            info!("Playback stopped");
        }
    }

    fn frames(&self) -> FrameReceiver {
        self.receiver.clone()
    }
}

impl Drop for GstPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}
