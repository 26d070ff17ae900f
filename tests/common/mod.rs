// SPDX-License-Identifier: GPL-3.0-only

//! Scripted capabilities for driving a capture session in tests

#![allow(dead_code)]

use futures::FutureExt;
use futures::future::BoxFuture;
use inapp_camera::backends::camera::{
    BackendError, BackendResult, Binding, CameraCapability, FrameReceiver, FrameSender, Lens,
    PipelineFailure, RecordingCompletion, frame_slot,
};
use inapp_camera::backends::playback::PlaybackCapability;
use inapp_camera::permissions::{
    PermissionProvider, PermissionStatus, PlatformProfile, RequiredPermissions,
};
use inapp_camera::storage::{ArtifactRef, OutputTarget};
use inapp_camera::{
    Capabilities, CaptureController, Notification, SessionChannels, SessionSettings,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

pub type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraCall {
    Bind(Lens),
    Unbind(Lens),
    StartRecording(PathBuf),
    StopRecording,
}

#[derive(Default)]
pub struct CameraScript {
    pub calls: Vec<CameraCall>,
    pub fail_bind: bool,
    pub fail_start: bool,
    pub bound: Option<Lens>,
    pending: Option<(OutputTarget, oneshot::Sender<BackendResult<ArtifactRef>>)>,
    preview_failure: Option<oneshot::Sender<BackendError>>,
}

impl CameraScript {
    /// Break the bound preview pipeline after it started
    pub fn fail_preview(&mut self, message: &str) {
        let failure = self.preview_failure.take().expect("no preview bound");
        let _ = failure.send(BackendError::Pipeline(message.into()));
    }

    pub fn has_recording(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve the running recording; returns its target
    pub fn finish_recording(&mut self, saved: bool) -> OutputTarget {
        let (target, done) = self.pending.take().expect("no recording in progress");
        let result = if saved {
            Ok(target.clone().into_artifact())
        } else {
            Err(BackendError::Pipeline("No space left on device".into()))
        };
        let _ = done.send(result);
        target
    }

    pub fn count(&self, wanted: impl Fn(&CameraCall) -> bool) -> usize {
        self.calls.iter().filter(|c| wanted(c)).count()
    }
}

pub struct MockCamera {
    script: Shared<CameraScript>,
    next_id: u64,
    frames: FrameSender,
    frames_rx: FrameReceiver,
}

impl CameraCapability for MockCamera {
    fn bind(&mut self, lens: Lens) -> BackendResult<Binding> {
        let mut script = lock(&self.script);
        script.calls.push(CameraCall::Bind(lens));
        assert!(script.bound.is_none(), "bind while {:?} is bound", script.bound);
        if script.fail_bind {
            return Err(BackendError::DeviceNotFound(format!("{} lens", lens)));
        }
        script.bound = Some(lens);
        self.next_id += 1;
        let (failure_tx, failure) = oneshot::channel();
        script.preview_failure = Some(failure_tx);
        Ok(Binding::new(lens, self.next_id, failure))
    }

    fn unbind(&mut self, binding: Binding) {
        let mut script = lock(&self.script);
        script.calls.push(CameraCall::Unbind(binding.lens()));
        script.bound = None;
        script.preview_failure = None;
        self.frames.send_replace(None);
    }

    fn start_recording(
        &mut self,
        _binding: &Binding,
        target: OutputTarget,
    ) -> BackendResult<RecordingCompletion> {
        let mut script = lock(&self.script);
        script
            .calls
            .push(CameraCall::StartRecording(target.path.clone()));
        if script.fail_start {
            return Err(BackendError::InitializationFailed("encoder missing".into()));
        }
        let (tx, rx) = oneshot::channel();
        script.pending = Some((target, tx));
        Ok(rx)
    }

    fn stop_recording(&mut self, _binding: &Binding) -> BackendResult<()> {
        lock(&self.script).calls.push(CameraCall::StopRecording);
        Ok(())
    }

    fn frames(&self) -> FrameReceiver {
        self.frames_rx.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCall {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    Stop,
}

#[derive(Default)]
pub struct PlaybackScript {
    pub calls: Vec<PlaybackCall>,
    pub position: Duration,
    pub fail_load: bool,
    failure: Option<oneshot::Sender<BackendError>>,
}

impl PlaybackScript {
    /// Break the loaded clip
    pub fn fail_clip(&mut self, message: &str) {
        let failure = self.failure.take().expect("no clip loaded");
        let _ = failure.send(BackendError::Pipeline(message.into()));
    }
}

pub struct MockPlayback {
    script: Shared<PlaybackScript>,
    frames_rx: FrameReceiver,
    _frames: FrameSender,
}

impl PlaybackCapability for MockPlayback {
    fn load(&mut self, uri: &str) -> BackendResult<PipelineFailure> {
        let mut script = lock(&self.script);
        script.calls.push(PlaybackCall::Load(uri.to_string()));
        if script.fail_load {
            return Err(BackendError::Pipeline("unsupported container".into()));
        }
        script.position = Duration::ZERO;
        let (failure_tx, failure) = oneshot::channel();
        script.failure = Some(failure_tx);
        Ok(failure)
    }

    fn play(&mut self) -> BackendResult<()> {
        lock(&self.script).calls.push(PlaybackCall::Play);
        Ok(())
    }

    fn pause(&mut self) -> BackendResult<()> {
        lock(&self.script).calls.push(PlaybackCall::Pause);
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> BackendResult<()> {
        let mut script = lock(&self.script);
        script.calls.push(PlaybackCall::Seek(position));
        script.position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        lock(&self.script).position
    }

    fn stop(&mut self) {
        let mut script = lock(&self.script);
        script.calls.push(PlaybackCall::Stop);
        script.failure = None;
    }

    fn frames(&self) -> FrameReceiver {
        self.frames_rx.clone()
    }
}

pub struct PermissionScript {
    /// Answer to a check without prompting
    pub current: bool,
    /// Answer the user gives to a request
    pub answer: bool,
    pub requests: usize,
}

pub struct MockPermissions {
    script: Shared<PermissionScript>,
}

fn answer(required: &RequiredPermissions, granted: bool) -> PermissionStatus {
    PermissionStatus::from_pairs(required.iter().map(|p| (p, granted)))
}

impl PermissionProvider for MockPermissions {
    fn check(&self, required: &RequiredPermissions) -> PermissionStatus {
        answer(required, lock(&self.script).current)
    }

    fn request(&mut self, required: &RequiredPermissions) -> BoxFuture<'static, PermissionStatus> {
        let mut script = lock(&self.script);
        script.requests += 1;
        let granted = script.answer;
        script.current = granted;
        futures::future::ready(answer(required, granted)).boxed()
    }
}

/// A session wired to scripted capabilities
pub struct Harness {
    pub session: CaptureController,
    pub channels: SessionChannels,
    pub camera: Shared<CameraScript>,
    pub playback: Shared<PlaybackScript>,
    pub permissions: Shared<PermissionScript>,
    pub output: tempfile::TempDir,
}

impl Harness {
    /// Must be called inside a tokio runtime
    pub fn new(granted: bool) -> Self {
        Self::with_level(granted, 33)
    }

    pub fn with_level(granted: bool, level: u32) -> Self {
        let output = tempfile::tempdir().unwrap();
        let camera = Arc::new(Mutex::new(CameraScript::default()));
        let playback = Arc::new(Mutex::new(PlaybackScript::default()));
        let permissions = Arc::new(Mutex::new(PermissionScript {
            current: granted,
            answer: granted,
            requests: 0,
        }));

        let (frames, frames_rx) = frame_slot();
        let (playback_frames, playback_rx) = frame_slot();
        let capabilities = Capabilities {
            camera: Box::new(MockCamera {
                script: camera.clone(),
                next_id: 0,
                frames,
                frames_rx,
            }),
            playback: Box::new(MockPlayback {
                script: playback.clone(),
                frames_rx: playback_rx,
                _frames: playback_frames,
            }),
            permissions: Box::new(MockPermissions {
                script: permissions.clone(),
            }),
        };
        let settings = SessionSettings {
            platform: PlatformProfile::new(level),
            initial_lens: Lens::Front,
            output_root: output.path().to_path_buf(),
        };

        let (session, channels) = CaptureController::new(capabilities, settings);
        Self {
            session,
            channels,
            camera,
            playback,
            permissions,
            output,
        }
    }

    /// Granted session, foregrounded and previewing
    pub async fn previewing() -> Self {
        let mut harness = Self::new(true);
        harness.session.update(inapp_camera::Message::Foreground);
        harness.pump().await;
        harness
    }

    pub fn camera(&self) -> MutexGuard<'_, CameraScript> {
        lock(&self.camera)
    }

    pub fn playback(&self) -> MutexGuard<'_, PlaybackScript> {
        lock(&self.playback)
    }

    pub fn permissions(&self) -> MutexGuard<'_, PermissionScript> {
        lock(&self.permissions)
    }

    /// Let spawned tasks run and feed their messages into the session
    pub async fn pump(&mut self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
            while let Ok(message) = self.channels.messages.try_recv() {
                self.session.update(message);
            }
        }
    }

    /// Advance (paused) time by `duration`, then pump
    pub async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.pump().await;
    }

    /// Notifications emitted since the last call
    pub fn notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.channels.notifications.try_recv() {
            out.push(notification);
        }
        out
    }
}
