// SPDX-License-Identifier: GPL-3.0-only

//! Recording output locations and artifact references
//!
//! Clips are named by their millisecond epoch timestamp and stored under the
//! logical `DCIM/InAppCamera/` folder, mapped below the configured output root
//! (the user's video directory unless configured otherwise).

use crate::backends::camera::{BackendError, BackendResult};
use crate::constants::storage::{DCIM_DIR, SAVE_FOLDER, VIDEO_EXTENSION, VIDEO_MIME_TYPE};
use chrono::{DateTime, Utc};
use gstreamer as gst;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the next recording will be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Display name (millisecond epoch timestamp, no extension)
    pub display_name: String,
    /// Container MIME type
    pub mime_type: &'static str,
    /// Logical directory, e.g. `DCIM/InAppCamera/`
    pub relative_path: String,
    /// Physical file path
    pub path: PathBuf,
}

impl OutputTarget {
    /// Build the target for a recording started at `now` below `root`
    pub fn at(root: &Path, now: DateTime<Utc>) -> Self {
        let display_name = now.timestamp_millis().to_string();
        let path = output_directory(root).join(format!("{}.{}", display_name, VIDEO_EXTENSION));
        Self {
            display_name,
            mime_type: VIDEO_MIME_TYPE,
            relative_path: relative_directory(),
            path,
        }
    }

    /// Build the target for a recording starting right now
    pub fn now(root: &Path) -> Self {
        Self::at(root, Utc::now())
    }

    /// The reference handed out once this target has been written
    pub fn into_artifact(self) -> ArtifactRef {
        ArtifactRef {
            display_name: self.display_name,
            mime_type: self.mime_type,
            path: self.path,
        }
    }
}

/// Opaque locator of a saved recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub display_name: String,
    pub mime_type: &'static str,
    pub path: PathBuf,
}

impl ArtifactRef {
    /// `file://` URI of the clip, for playback backends that take URIs
    ///
    /// Relative paths are resolved against the current directory first.
    pub fn uri(&self) -> BackendResult<String> {
        let absolute = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()?.join(&self.path)
        };
        gst::glib::filename_to_uri(&absolute, None)
            .map(|uri| uri.to_string())
            .map_err(|e| BackendError::Other(format!("No URI for {}: {}", absolute.display(), e)))
    }
}

/// Logical directory string, always with a trailing slash
pub fn relative_directory() -> String {
    format!("{}/{}/", DCIM_DIR, SAVE_FOLDER)
}

/// Physical directory the clips are written to
pub fn output_directory(root: &Path) -> PathBuf {
    root.join(DCIM_DIR).join(SAVE_FOLDER)
}

/// Default output root: the user's video directory, else home, else cwd
pub fn default_output_root() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Create the output directory for `target` if it does not exist yet
pub fn prepare(target: &OutputTarget) -> std::io::Result<()> {
    if let Some(parent) = target.path.parent() {
        std::fs::create_dir_all(parent)?;
        debug!(dir = %parent.display(), "Output directory ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn target_is_named_by_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let target = OutputTarget::at(Path::new("/media"), now);

        assert_eq!(target.display_name, "1700000000123");
        assert_eq!(target.mime_type, "video/mp4");
        assert_eq!(target.relative_path, "DCIM/InAppCamera/");
        assert_eq!(
            target.path,
            PathBuf::from("/media/DCIM/InAppCamera/1700000000123.mp4")
        );
    }

    #[test]
    fn uri_escapes_spaces() {
        let artifact = ArtifactRef {
            display_name: "1".into(),
            mime_type: VIDEO_MIME_TYPE,
            path: PathBuf::from("/home/me/My Videos/1.mp4"),
        };
        assert_eq!(
            artifact.uri().unwrap(),
            "file:///home/me/My%20Videos/1.mp4"
        );
    }

    #[test]
    fn relative_path_resolves_against_working_directory() {
        let artifact = ArtifactRef {
            display_name: "1".into(),
            mime_type: VIDEO_MIME_TYPE,
            path: PathBuf::from("clips/1.mp4"),
        };
        let uri = artifact.uri().unwrap();
        assert!(uri.starts_with("file:///"));
        assert!(uri.ends_with("/clips/1.mp4"));
    }

    #[test]
    fn prepare_creates_nested_directory() {
        let root = tempfile::tempdir().unwrap();
        let target = OutputTarget::now(root.path());
        prepare(&target).unwrap();
        assert!(output_directory(root.path()).is_dir());
    }
}
