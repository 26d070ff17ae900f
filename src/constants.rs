// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Video encoder bitrate presets
///
/// Clips are small (400x400 at 10 fps by default), so the tiers start low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitratePreset {
    /// Smaller files, reduced quality
    Low,
    /// Balanced quality and file size (default)
    #[default]
    Medium,
    /// Larger files, better quality
    High,
}

impl BitratePreset {
    /// All preset variants, lowest quality first
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Bitrate in kbps for a given output resolution
    ///
    /// - SD (up to 640 wide): Low=500, Medium=1000, High=2000
    /// - HD (up to 1280 wide): Low=2500, Medium=5000, High=10000
    /// - Full HD and above: Low=4000, Medium=8000, High=16000
    pub fn bitrate_kbps(&self, width: u32, _height: u32) -> u32 {
        match (ResolutionTier::for_width(width), self) {
            (ResolutionTier::SD, BitratePreset::Low) => 500,
            (ResolutionTier::SD, BitratePreset::Medium) => 1_000,
            (ResolutionTier::SD, BitratePreset::High) => 2_000,
            (ResolutionTier::HD, BitratePreset::Low) => 2_500,
            (ResolutionTier::HD, BitratePreset::Medium) => 5_000,
            (ResolutionTier::HD, BitratePreset::High) => 10_000,
            (ResolutionTier::FullHD, BitratePreset::Low) => 4_000,
            (ResolutionTier::FullHD, BitratePreset::Medium) => 8_000,
            (ResolutionTier::FullHD, BitratePreset::High) => 16_000,
        }
    }
}

/// Resolution tiers for bitrate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    SD,
    HD,
    FullHD,
}

impl ResolutionTier {
    pub fn for_width(width: u32) -> Self {
        match width {
            w if w > 1280 => ResolutionTier::FullHD,
            w if w > 640 => ResolutionTier::HD,
            _ => ResolutionTier::SD,
        }
    }
}

/// Animation timing
pub mod timing {
    use std::time::Duration;

    /// Duration of the switch-camera flip rotation
    pub const LENS_FLIP_DURATION: Duration = Duration::from_millis(200);

    /// Delay after the flip starts before the switch icon changes (mid-rotation)
    pub const LENS_ICON_SWAP_DELAY: Duration = Duration::from_millis(100);

    /// Flip rotation angle in degrees
    pub const LENS_FLIP_ANGLE: f32 = 180.0;

    /// One direction of the record pulse (1.0 -> 0.5 or back)
    pub const RECORD_PULSE_HALF_PERIOD: Duration = Duration::from_millis(300);

    /// Lowest opacity of the record button while recording
    pub const RECORD_PULSE_MIN_OPACITY: f32 = 0.5;

    /// How long a notification stays on the terminal status line
    pub const NOTIFICATION_DISPLAY: Duration = Duration::from_secs(3);
}

/// Recording output
pub mod storage {
    /// Top-level media directory the clips live under
    pub const DCIM_DIR: &str = "DCIM";

    /// Application folder inside DCIM
    pub const SAVE_FOLDER: &str = "InAppCamera";

    /// Container MIME type of recorded clips
    pub const VIDEO_MIME_TYPE: &str = "video/mp4";

    /// File extension matching [`VIDEO_MIME_TYPE`]
    pub const VIDEO_EXTENSION: &str = "mp4";
}

/// Platform permission profile
pub mod platform {
    /// Highest platform level that still needs an explicit storage grant
    pub const LEGACY_STORAGE_MAX_LEVEL: u32 = 28;

    /// Level assumed when the configuration does not say otherwise
    pub const DEFAULT_LEVEL: u32 = 33;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Preview frames are scaled to this size before reaching the UI (4:3)
    pub const PREVIEW_WIDTH: u32 = 160;
    pub const PREVIEW_HEIGHT: u32 = 120;

    /// Appsink queue depth (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Pixel format delivered to the UI
    pub const OUTPUT_FORMAT: &str = "RGB";

    /// How long bind/load wait for a pipeline to reach its target state
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Poll interval of the bus watcher threads
    pub const BUS_POLL_MS: u64 = 100;
}
