// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate
//!
//! The session needs camera and microphone access, plus storage access on
//! legacy platform levels. The required set is resolved once from the
//! [`PlatformProfile`] and never mutated afterwards. Granting is
//! all-or-nothing: a single denial hides the capture controls.

use crate::constants::platform::LEGACY_STORAGE_MAX_LEVEL;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A capability the session must be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Camera,
    Microphone,
    Storage,
}

impl Permission {
    pub fn display_name(&self) -> &'static str {
        match self {
            Permission::Camera => "Camera",
            Permission::Microphone => "Microphone",
            Permission::Storage => "Storage",
        }
    }
}

/// Platform facts that decide which permissions are required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub level: u32,
}

impl PlatformProfile {
    pub fn new(level: u32) -> Self {
        Self { level }
    }

    /// Whether writing recordings needs an explicit storage grant
    pub fn needs_legacy_storage(&self) -> bool {
        self.level <= LEGACY_STORAGE_MAX_LEVEL
    }
}

/// The immutable set of permissions a session requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPermissions(Vec<Permission>);

impl RequiredPermissions {
    pub fn resolve(profile: PlatformProfile) -> Self {
        let mut required = vec![Permission::Camera, Permission::Microphone];
        if profile.needs_legacy_storage() {
            required.push(Permission::Storage);
        }
        Self(required)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }
}

/// Grant state of every required permission
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionStatus {
    granted: BTreeMap<Permission, bool>,
}

impl PermissionStatus {
    /// Status from `(permission, granted)` pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Permission, bool)>) -> Self {
        Self {
            granted: pairs.into_iter().collect(),
        }
    }

    /// Every permission in `required` granted
    pub fn all_granted(required: &RequiredPermissions) -> Self {
        Self::from_pairs(required.iter().map(|p| (p, true)))
    }

    /// True iff every required permission is present and granted.
    /// Answers outside `required` are ignored; missing answers count as denied.
    pub fn satisfies(&self, required: &RequiredPermissions) -> bool {
        required
            .iter()
            .all(|p| self.granted.get(&p).copied().unwrap_or(false))
    }

    /// Required permissions that are not granted
    pub fn missing(&self, required: &RequiredPermissions) -> Vec<Permission> {
        required
            .iter()
            .filter(|p| !self.granted.get(p).copied().unwrap_or(false))
            .collect()
    }

    pub fn is_granted(&self, permission: Permission) -> bool {
        self.granted.get(&permission).copied().unwrap_or(false)
    }
}

/// Source of permission decisions
pub trait PermissionProvider: Send {
    /// Current status without prompting
    fn check(&self, required: &RequiredPermissions) -> PermissionStatus;

    /// Ask for the permissions; the future resolves with the response
    fn request(&mut self, required: &RequiredPermissions) -> BoxFuture<'static, PermissionStatus>;
}

/// Desktop permission source backed by file-system access checks
///
/// - Camera: every configured lens device node is readable and writable
/// - Microphone: the sound device directory is accessible (granted when audio
///   recording is off)
/// - Storage: the output root or its nearest existing ancestor is writable
///
/// Requests cannot prompt on the desktop; they re-check.
#[derive(Debug, Clone)]
pub struct DevicePermissions {
    camera_devices: Vec<PathBuf>,
    sound_device: Option<PathBuf>,
    output_root: PathBuf,
}

impl DevicePermissions {
    pub fn new(camera_devices: Vec<PathBuf>, record_audio: bool, output_root: PathBuf) -> Self {
        Self {
            camera_devices,
            sound_device: record_audio.then(|| PathBuf::from("/dev/snd")),
            output_root,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        let devices = [config.front_device.as_ref(), config.back_device.as_ref()]
            .into_iter()
            .flatten()
            .map(PathBuf::from)
            .collect();
        Self::new(devices, config.record_audio, config.output_root())
    }

    fn evaluate(&self, permission: Permission) -> bool {
        let granted = match permission {
            Permission::Camera => self
                .camera_devices
                .iter()
                .all(|dev| has_access(dev, libc::R_OK | libc::W_OK)),
            Permission::Microphone => self
                .sound_device
                .as_deref()
                .is_none_or(|dev| has_access(dev, libc::R_OK | libc::X_OK)),
            Permission::Storage => nearest_existing(&self.output_root)
                .is_some_and(|dir| has_access(&dir, libc::W_OK | libc::X_OK)),
        };
        debug!(permission = permission.display_name(), granted, "Permission checked");
        granted
    }
}

impl PermissionProvider for DevicePermissions {
    fn check(&self, required: &RequiredPermissions) -> PermissionStatus {
        PermissionStatus::from_pairs(required.iter().map(|p| (p, self.evaluate(p))))
    }

    fn request(&mut self, required: &RequiredPermissions) -> BoxFuture<'static, PermissionStatus> {
        let status = self.check(required);
        Box::pin(async move { status })
    }
}

/// `access(2)` on `path` with `mode`
fn has_access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_encoded_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

fn nearest_existing(path: &Path) -> Option<PathBuf> {
    path.ancestors().find(|p| p.exists()).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_only_required_on_legacy_levels() {
        let legacy = RequiredPermissions::resolve(PlatformProfile::new(28));
        let modern = RequiredPermissions::resolve(PlatformProfile::new(29));

        assert!(legacy.contains(Permission::Storage));
        assert!(!modern.contains(Permission::Storage));
        assert!(modern.contains(Permission::Camera));
        assert!(modern.contains(Permission::Microphone));
    }

    #[test]
    fn any_denial_fails_the_gate() {
        let required = RequiredPermissions::resolve(PlatformProfile::new(33));
        let status =
            PermissionStatus::from_pairs([(Permission::Camera, true), (Permission::Microphone, false)]);

        assert!(!status.satisfies(&required));
        assert_eq!(status.missing(&required), vec![Permission::Microphone]);
    }

    #[test]
    fn missing_answer_counts_as_denied() {
        let required = RequiredPermissions::resolve(PlatformProfile::new(21));
        let status =
            PermissionStatus::from_pairs([(Permission::Camera, true), (Permission::Microphone, true)]);

        assert!(!status.satisfies(&required));
        assert_eq!(status.missing(&required), vec![Permission::Storage]);
    }

    #[test]
    fn storage_check_walks_up_to_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DevicePermissions::new(Vec::new(), false, dir.path().join("not/yet/here"));
        let required = RequiredPermissions::resolve(PlatformProfile::new(28));

        let status = provider.check(&required);
        assert!(status.is_granted(Permission::Storage));
        assert!(status.is_granted(Permission::Camera));
        assert!(status.is_granted(Permission::Microphone));
    }

    #[test]
    fn missing_camera_node_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DevicePermissions::new(
            vec![dir.path().join("video99")],
            false,
            dir.path().to_path_buf(),
        );
        let required = RequiredPermissions::resolve(PlatformProfile::new(33));
        assert!(!provider.check(&required).is_granted(Permission::Camera));
    }
}
