// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera capability
//!
//! Each lens maps to a V4L2 device node from the configuration, or to a
//! `videotestsrc` pattern when no node is configured. Preview frames are
//! scaled to a small RGB image and pushed into a latest-frame slot.
//!
//! Recording replaces the preview pipeline with a tee'd one: one branch keeps
//! feeding the preview slot, the other encodes H.264 into MP4. Stopping sends
//! EOS; a bus watcher thread waits for the muxer to finish and then reports
//! the outcome through the completion channel.
//!
//! Preview pipelines get a watcher of their own that forwards the first error
//! posted after the preview started, through the binding's failure receiver.

use super::{Binding, BackendError, BackendResult, FrameReceiver, FrameSender, Lens, PreviewFrame};
use super::{CameraCapability, PipelineFailure, RecordingCompletion, frame_slot};
use crate::config::{Config, VideoSettings};
use crate::constants::pipeline::{
    BUS_POLL_MS, MAX_BUFFERS, OUTPUT_FORMAT, PREVIEW_HEIGHT, PREVIEW_WIDTH, START_TIMEOUT_SECS,
};
use crate::storage::{self, OutputTarget};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Name of the appsink element feeding the preview slot
pub(crate) const PREVIEW_SINK: &str = "preview";

/// Camera settings the pipelines are built from
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub front_device: Option<String>,
    pub back_device: Option<String>,
    pub record_audio: bool,
    pub video: VideoSettings,
}

impl CameraSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            front_device: config.front_device.clone(),
            back_device: config.back_device.clone(),
            record_audio: config.record_audio,
            video: config.video.clone(),
        }
    }

    fn device_for(&self, lens: Lens) -> Option<&str> {
        match lens {
            Lens::Front => self.front_device.as_deref(),
            Lens::Back => self.back_device.as_deref(),
        }
    }
}

enum Stage {
    Preview(gst::Pipeline),
    Recording(gst::Pipeline),
    /// Recording stopped or failed; only unbind is valid
    Spent,
}

struct Active {
    binding_id: u64,
    lens: Lens,
    stage: Stage,
}

/// Camera capability backed by GStreamer pipelines
pub struct GstCamera {
    settings: CameraSettings,
    frames: Arc<FrameSender>,
    receiver: FrameReceiver,
    next_binding_id: u64,
    active: Option<Active>,
}

impl GstCamera {
    pub fn new(settings: CameraSettings) -> Self {
        let (frames, receiver) = frame_slot();
        Self {
            settings,
            frames: Arc::new(frames),
            receiver,
            next_binding_id: 1,
            active: None,
        }
    }

    fn active_for(&mut self, binding: &Binding) -> BackendResult<&mut Active> {
        match self.active.as_mut() {
            Some(active) if active.binding_id == binding.id() => Ok(active),
            _ => Err(BackendError::NotBound),
        }
    }

    fn launch(&self, description: &str) -> BackendResult<gst::Pipeline> {
        gst::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;
        debug!(pipeline = %description, "Launching pipeline");

        let pipeline = gst::parse::launch(description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Not a pipeline".into()))?;

        let appsink = pipeline
            .by_name(PREVIEW_SINK)
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| BackendError::InitializationFailed("Preview sink missing".into()))?;
        attach_frame_sink(&appsink, Arc::clone(&self.frames));

        Ok(pipeline)
    }
}

impl CameraCapability for GstCamera {
    fn bind(&mut self, lens: Lens) -> BackendResult<Binding> {
        if let Some(active) = &self.active {
            error!(current = %active.lens, requested = %lens, "Bind while already bound");
            return Err(BackendError::InitializationFailed(
                "Camera is already bound".into(),
            ));
        }

        let source = source_description(self.settings.device_for(lens), lens);
        let pipeline = self.launch(&preview_description(&source))?;

        let failure = match start_pipeline(&pipeline, gst::State::Playing)
            .and_then(|()| watch_for_failure(&pipeline, "preview-bus"))
        {
            Ok(failure) => failure,
            Err(e) => {
                let _ = pipeline.set_state(gst::State::Null);
                error!(%lens, error = %e, "Preview failed to start");
                return Err(e);
            }
        };

        let binding_id = self.next_binding_id;
        self.next_binding_id += 1;
        self.active = Some(Active {
            binding_id,
            lens,
            stage: Stage::Preview(pipeline),
        });

        info!(%lens, binding_id, "Camera bound");
        Ok(Binding::new(lens, binding_id, failure))
    }

    fn unbind(&mut self, binding: Binding) {
        let Some(active) = self.active.take_if(|a| a.binding_id == binding.id()) else {
            warn!(binding_id = binding.id(), "Unbind of unknown binding ignored");
            return;
        };

        match active.stage {
            Stage::Preview(pipeline) | Stage::Recording(pipeline) => {
                let _ = pipeline.set_state(gst::State::Null);
            }
            Stage::Spent => {}
        }
        self.frames.send_replace(None);
        info!(lens = %active.lens, binding_id = active.binding_id, "Camera unbound");
    }

    fn start_recording(
        &mut self,
        binding: &Binding,
        target: OutputTarget,
    ) -> BackendResult<RecordingCompletion> {
        let settings = self.settings.clone();
        let active = self.active_for(binding)?;
        let preview = match &active.stage {
            Stage::Preview(pipeline) => pipeline.clone(),
            Stage::Recording(_) => return Err(BackendError::RecordingInProgress),
            Stage::Spent => return Err(BackendError::NotBound),
        };
        let lens = active.lens;

        storage::prepare(&target)?;

        // The device can only be opened once; release the preview first
        let _ = preview.set_state(gst::State::Null);
        active.stage = Stage::Spent;

        let source = source_description(settings.device_for(lens), lens);
        let description = recording_description(&source, &settings, &target);
        let pipeline = self.launch(&description)?;

        if let Err(e) = start_pipeline(&pipeline, gst::State::Playing) {
            let _ = pipeline.set_state(gst::State::Null);
            error!(error = %e, "Recording failed to start");
            return Err(e);
        }

        let (sender, completion) = tokio::sync::oneshot::channel();
        let watched = pipeline.clone();
        let artifact = target.clone().into_artifact();
        let spawned = std::thread::Builder::new()
            .name("recording-bus".into())
            .spawn(move || {
                let result = wait_for_finalize(&watched).map(|()| artifact);
                let _ = watched.set_state(gst::State::Null);
                match &result {
                    Ok(artifact) => info!(path = %artifact.path.display(), "Recording saved"),
                    Err(e) => error!(error = %e, "Recording failed"),
                }
                let _ = sender.send(result);
            });
        if let Err(e) = spawned {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(e.into());
        }

        if let Some(active) = self.active.as_mut() {
            active.stage = Stage::Recording(pipeline);
        }
        info!(path = %target.path.display(), %lens, "Recording started");
        Ok(completion)
    }

    fn stop_recording(&mut self, binding: &Binding) -> BackendResult<()> {
        let active = self.active_for(binding)?;
        let Stage::Recording(pipeline) = std::mem::replace(&mut active.stage, Stage::Spent) else {
            return Err(BackendError::NoRecordingInProgress);
        };

        info!("Sending EOS to recording pipeline");
        if !pipeline.send_event(gst::event::Eos::new()) {
            // Tearing down also ends the recording-bus thread
            let _ = pipeline.set_state(gst::State::Null);
            return Err(BackendError::Pipeline("Recording pipeline rejected EOS".into()));
        }
        Ok(())
    }

    fn frames(&self) -> FrameReceiver {
        self.receiver.clone()
    }
}

impl Drop for GstCamera {
    fn drop(&mut self) {
        if let Some(Active {
            stage: Stage::Preview(pipeline) | Stage::Recording(pipeline),
            ..
        }) = self.active.take()
        {
            let _ = pipeline.set_state(gst::State::Null);
        }
    }
}

/// Move `pipeline` to `state` and wait until it gets there
///
/// A failed state change or an error posted while starting becomes `Err`.
/// A pipeline still changing state after the timeout counts as started.
pub(crate) fn start_pipeline(pipeline: &gst::Pipeline, state: gst::State) -> BackendResult<()> {
    let changed = pipeline.set_state(state);
    let (settled, current, pending) =
        pipeline.state(gst::ClockTime::from_seconds(START_TIMEOUT_SECS));

    if let Some(err) = pop_bus_error(pipeline) {
        return Err(err);
    }
    if let Ok(gst::StateChangeSuccess::Async) = settled {
        warn!(?current, ?pending, "Pipeline still starting after timeout");
    }
    changed
        .and(settled)
        .map(|_| ())
        .map_err(|e| BackendError::InitializationFailed(format!("Failed to reach {:?}: {}", state, e)))
}

/// First queued error on the bus, logging warnings on the way
fn pop_bus_error(pipeline: &gst::Pipeline) -> Option<BackendError> {
    let bus = pipeline.bus()?;
    while let Some(message) =
        bus.pop_filtered(&[gst::MessageType::Error, gst::MessageType::Warning])
    {
        match message.view() {
            gst::MessageView::Error(err) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error while starting"
                );
                return Some(BackendError::Pipeline(err.error().to_string()));
            }
            gst::MessageView::Warning(warning) => {
                warn!(
                    warning = %warning.error(),
                    debug = ?warning.debug(),
                    "GStreamer warning while starting"
                );
            }
            _ => {}
        }
    }
    None
}

/// Spawn a thread named `name` that forwards the first error of `pipeline`
///
/// The thread exits without sending once the pipeline is set to `Null`.
pub(crate) fn watch_for_failure(
    pipeline: &gst::Pipeline,
    name: &str,
) -> BackendResult<PipelineFailure> {
    let (sender, failure) = tokio::sync::oneshot::channel();
    let watched = pipeline.clone();
    std::thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            if let Some(err) = wait_for_error(&watched) {
                let _ = sender.send(err);
            }
        })?;
    Ok(failure)
}

fn wait_for_error(pipeline: &gst::Pipeline) -> Option<BackendError> {
    let bus = pipeline.bus()?;

    loop {
        let message = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(BUS_POLL_MS),
            &[gst::MessageType::Error],
        );

        match message.as_ref().map(|m| m.view()) {
            Some(gst::MessageView::Error(err)) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error while running"
                );
                return Some(BackendError::Pipeline(err.error().to_string()));
            }
            Some(_) => {}
            None if pipeline.current_state() == gst::State::Null => return None,
            None => {}
        }
    }
}

/// Block until the pipeline reports EOS (Ok), an error, or is torn down
fn wait_for_finalize(pipeline: &gst::Pipeline) -> BackendResult<()> {
    let bus = pipeline
        .bus()
        .ok_or_else(|| BackendError::Pipeline("No bus available".into()))?;

    loop {
        let message = bus.timed_pop_filtered(
            gst::ClockTime::from_mseconds(BUS_POLL_MS),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        );

        match message.as_ref().map(|m| m.view()) {
            Some(gst::MessageView::Eos(_)) => return Ok(()),
            Some(gst::MessageView::Error(err)) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error while recording"
                );
                return Err(BackendError::Pipeline(err.error().to_string()));
            }
            Some(_) => {}
            None if pipeline.current_state() == gst::State::Null => {
                return Err(BackendError::Pipeline("Recording was abandoned".into()));
            }
            None => {}
        }
    }
}

/// Push every sample of `appsink` into the latest-frame slot
pub(crate) fn attach_frame_sink(appsink: &gst_app::AppSink, frames: Arc<FrameSender>) {
    appsink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                if let Some(frame) = frame_from_sample(&sample) {
                    frames.send_replace(Some(Arc::new(frame)));
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

fn frame_from_sample(sample: &gst::Sample) -> Option<PreviewFrame> {
    let info = gstreamer_video::VideoInfo::from_caps(sample.caps()?).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    Some(PreviewFrame {
        width: info.width(),
        height: info.height(),
        stride: info.stride()[0] as u32,
        data: Arc::from(map.as_slice()),
        captured_at: Instant::now(),
    })
}

/// Caps and sink shared by every branch that feeds the UI
///
/// Live sources render as frames arrive; clip playback has to follow the clock.
pub(crate) fn preview_sink_description(sync: bool) -> String {
    format!(
        "videoconvert ! videoscale ! video/x-raw,format={},width={},height={} ! \
         appsink name={} max-buffers={} drop=true sync={}",
        OUTPUT_FORMAT, PREVIEW_WIDTH, PREVIEW_HEIGHT, PREVIEW_SINK, MAX_BUFFERS, sync
    )
}

fn source_description(device: Option<&str>, lens: Lens) -> String {
    match device {
        Some(device) => format!("v4l2src device=\"{}\"", escape(device)),
        None => {
            let pattern = match lens {
                Lens::Front => "ball",
                Lens::Back => "smpte",
            };
            format!("videotestsrc is-live=true pattern={}", pattern)
        }
    }
}

fn preview_description(source: &str) -> String {
    format!("{} ! {}", source, preview_sink_description(false))
}

fn recording_description(source: &str, settings: &CameraSettings, target: &OutputTarget) -> String {
    let video = &settings.video;
    let bitrate = video
        .bitrate_preset
        .bitrate_kbps(video.max_width, video.max_height);

    let mut description = format!(
        "{source} ! videoconvert ! videorate ! videoscale ! \
         video/x-raw,framerate={fps}/1,width=(int)[1,{w}],height=(int)[1,{h}] ! tee name=t \
         t. ! queue ! {preview} \
         t. ! queue ! videoconvert ! x264enc tune=zerolatency speed-preset=ultrafast bitrate={bitrate} ! \
         h264parse ! mp4mux name=mux ! filesink location=\"{location}\"",
        source = source,
        fps = video.framerate,
        w = video.max_width,
        h = video.max_height,
        preview = preview_sink_description(false),
        bitrate = bitrate,
        location = escape(&target.path.to_string_lossy()),
    );

    if settings.record_audio {
        description.push_str(
            " autoaudiosrc ! queue ! audioconvert ! audioresample ! avenc_aac ! aacparse ! mux.",
        );
    }
    description
}

/// Escape a value for a quoted `gst-launch` property
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    fn settings(record_audio: bool) -> CameraSettings {
        CameraSettings {
            front_device: Some("/dev/video0".into()),
            back_device: None,
            record_audio,
            video: VideoSettings::default(),
        }
    }

    #[test]
    fn configured_lens_uses_v4l2_device() {
        let settings = settings(false);
        assert_eq!(
            source_description(settings.device_for(Lens::Front), Lens::Front),
            "v4l2src device=\"/dev/video0\""
        );
    }

    #[test]
    fn unconfigured_lens_falls_back_to_test_pattern() {
        let settings = settings(false);
        let source = source_description(settings.device_for(Lens::Back), Lens::Back);
        assert!(source.starts_with("videotestsrc is-live=true"));
    }

    #[test]
    fn recording_pipeline_keeps_preview_branch_and_writes_mp4() {
        let now = chrono::Utc.timestamp_millis_opt(42).unwrap();
        let target = OutputTarget::at(Path::new("/tmp/out"), now);
        let description = recording_description("videotestsrc", &settings(false), &target);

        assert!(description.contains("tee name=t"));
        assert!(description.contains(&format!("appsink name={}", PREVIEW_SINK)));
        assert!(description.contains("mp4mux"));
        assert!(description.contains("location=\"/tmp/out/DCIM/InAppCamera/42.mp4\""));
        assert!(description.contains("framerate=10/1"));
        assert!(!description.contains("autoaudiosrc"));
    }

    #[test]
    fn audio_branch_joins_the_muxer() {
        let target = OutputTarget::now(Path::new("/tmp"));
        let description = recording_description("videotestsrc", &settings(true), &target);
        assert!(description.ends_with("aacparse ! mux."));
    }

    fn posted_error(pipeline: &gst::Pipeline, text: &str) {
        let message = gst::message::Error::builder(gst::CoreError::Failed, text).build();
        pipeline.bus().unwrap().post(message).unwrap();
    }

    #[test]
    fn bus_error_while_starting_is_returned() {
        gst::init().unwrap();
        let pipeline = gst::Pipeline::new();
        posted_error(&pipeline, "device busy");

        assert_eq!(
            pop_bus_error(&pipeline),
            Some(BackendError::Pipeline("device busy".into()))
        );
        assert_eq!(pop_bus_error(&pipeline), None);
    }

    #[test]
    fn failure_watcher_forwards_the_first_error() {
        gst::init().unwrap();
        let pipeline = gst::Pipeline::new();
        posted_error(&pipeline, "stream stopped");

        let failure = watch_for_failure(&pipeline, "test-bus").unwrap();
        assert_eq!(
            failure.blocking_recv(),
            Ok(BackendError::Pipeline("stream stopped".into()))
        );
    }

    #[test]
    fn failure_watcher_exits_quietly_on_teardown() {
        gst::init().unwrap();
        let pipeline = gst::Pipeline::new();
        assert_eq!(pipeline.current_state(), gst::State::Null);

        let failure = watch_for_failure(&pipeline, "test-bus").unwrap();
        assert!(failure.blocking_recv().is_err());
    }

    #[test]
    fn nulled_recording_pipeline_ends_the_finalize_wait() {
        // Error paths set the pipeline to Null; the recording-bus thread must
        // then report instead of polling forever
        gst::init().unwrap();
        let pipeline = gst::Pipeline::new();
        assert_eq!(
            wait_for_finalize(&pipeline),
            Err(BackendError::Pipeline("Recording was abandoned".into()))
        );
    }

    #[test]
    fn quotes_in_paths_are_escaped() {
        assert_eq!(escape(r#"/a "b"/c"#), r#"/a \"b\"/c"#);
    }
}
