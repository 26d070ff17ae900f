// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture session
//!
//! Backend operations return [`BackendError`](crate::backends::camera::BackendError);
//! the controller folds them into a [`SessionError`] before they reach the user
//! as a notification. None of these ever terminate the process.

use crate::backends::camera::BackendError;
use crate::permissions::Permission;
use std::fmt;

/// Session-level error taxonomy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// One or more required permissions were not granted
    PermissionDenied(Vec<Permission>),
    /// The camera pipeline could not be bound to the selected lens
    CapabilityBindFailure(BackendError),
    /// The record operation could not be started
    RecordingStartFailure(BackendError),
    /// The recording failed while running or while being finalized
    RecordingSaveFailure(BackendError),
    /// The saved clip could not be loaded, or broke, during review
    PlaybackFailure(BackendError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::PermissionDenied(missing) => {
                let names: Vec<&str> = missing.iter().map(|p| p.display_name()).collect();
                write!(f, "Permission request denied ({})", names.join(", "))
            }
            SessionError::CapabilityBindFailure(e) => write!(f, "Failed to start camera: {}", e),
            SessionError::RecordingStartFailure(e) => {
                write!(f, "Failed to start recording: {}", e)
            }
            SessionError::RecordingSaveFailure(e) => write!(f, "Error saving video: {}", e),
            SessionError::PlaybackFailure(e) => write!(f, "Cannot play recording: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::PermissionDenied(_) => None,
            SessionError::CapabilityBindFailure(e)
            | SessionError::RecordingStartFailure(e)
            | SessionError::RecordingSaveFailure(e)
            | SessionError::PlaybackFailure(e) => Some(e),
        }
    }
}

/// Configuration loading/saving errors
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration directory on this system
    NoConfigDir,
    /// Reading or writing the file failed
    Io(std::io::Error),
    /// The file is not valid configuration JSON
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "No configuration directory available"),
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
