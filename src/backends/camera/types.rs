// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera and playback capabilities

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which physical camera module is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lens {
    /// User-facing camera (default, as for a selfie clip)
    #[default]
    Front,
    /// World-facing camera
    Back,
}

impl Lens {
    /// The other lens
    pub fn flipped(self) -> Self {
        match self {
            Lens::Front => Lens::Back,
            Lens::Back => Lens::Front,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Lens::Front => "front",
            Lens::Back => "back",
        }
    }
}

impl std::fmt::Display for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Lens {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Lens::Front),
            "back" | "rear" => Ok(Lens::Back),
            other => Err(format!("unknown lens '{}' (expected front or back)", other)),
        }
    }
}

/// Proof that the camera is bound to a lens
///
/// Only a [`CameraCapability`](super::CameraCapability) creates one, and
/// `unbind` consumes it, so a holder of `Option<Binding>` can never have two
/// live bindings at once.
#[derive(Debug)]
pub struct Binding {
    lens: Lens,
    id: u64,
    failure: Option<PipelineFailure>,
}

impl Binding {
    /// Create a binding token. Called by capability implementations only.
    ///
    /// `failure` resolves if the preview breaks after it started.
    pub fn new(lens: Lens, id: u64, failure: PipelineFailure) -> Self {
        Self {
            lens,
            id,
            failure: Some(failure),
        }
    }

    /// Hand out the preview failure receiver; `None` after the first call
    pub fn take_failure(&mut self) -> Option<PipelineFailure> {
        self.failure.take()
    }

    pub fn lens(&self) -> Lens {
        self.lens
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// An RGB frame ready for display
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    /// Packed RGB, `stride * height` bytes
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl PreviewFrame {
    /// RGB triple at (x, y), clamped to the frame
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 3) as usize;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

/// Latest-frame slot shared between a pipeline and the presentation layer
pub type FrameSender = tokio::sync::watch::Sender<Option<Arc<PreviewFrame>>>;
pub type FrameReceiver = tokio::sync::watch::Receiver<Option<Arc<PreviewFrame>>>;

/// Create an empty latest-frame slot
pub fn frame_slot() -> (FrameSender, FrameReceiver) {
    tokio::sync::watch::channel(None)
}

/// Resolves with the first error a running pipeline posts
///
/// The sender is dropped without a value when the pipeline is shut down
/// normally.
pub type PipelineFailure = tokio::sync::oneshot::Receiver<BackendError>;

/// Result type for capability operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for capability operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to build or start a pipeline
    InitializationFailed(String),
    /// Camera device for the lens not found
    DeviceNotFound(String),
    /// Operation needs a binding but the camera is unbound
    NotBound,
    /// Recording already in progress
    RecordingInProgress,
    /// No recording in progress
    NoRecordingInProgress,
    /// Pipeline reported an error while running
    Pipeline(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::NotBound => write!(f, "Camera is not bound"),
            BackendError::RecordingInProgress => write!(f, "Recording already in progress"),
            BackendError::NoRecordingInProgress => write!(f, "No recording in progress"),
            BackendError::Pipeline(msg) => write!(f, "Pipeline error: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lens_flip_is_an_involution() {
        assert_eq!(Lens::Front.flipped(), Lens::Back);
        assert_eq!(Lens::Front.flipped().flipped(), Lens::Front);
    }

    #[test]
    fn lens_parses_rear_alias() {
        assert_eq!("rear".parse::<Lens>(), Ok(Lens::Back));
        assert_eq!("FRONT".parse::<Lens>(), Ok(Lens::Front));
        assert!("side".parse::<Lens>().is_err());
    }

    #[test]
    fn rgb_lookup_clamps_to_frame() {
        let frame = PreviewFrame {
            width: 2,
            height: 1,
            stride: 6,
            data: Arc::from(vec![1u8, 2, 3, 4, 5, 6].into_boxed_slice()),
            captured_at: Instant::now(),
        };
        assert_eq!(frame.rgb_at(0, 0), (1, 2, 3));
        assert_eq!(frame.rgb_at(9, 9), (4, 5, 6));
    }
}
