// SPDX-License-Identifier: GPL-3.0-only

//! Time-based animations driven by the view
//!
//! Neither animation owns a timer: the view samples them with the current
//! instant, and the controller schedules the completion messages it needs.

use crate::constants::timing::{
    LENS_FLIP_DURATION, RECORD_PULSE_HALF_PERIOD, RECORD_PULSE_MIN_OPACITY,
};
use std::time::{Duration, Instant};

/// Recording indicator: opacity 1.0 -> 0.5 -> 1.0, repeating until cancelled
#[derive(Debug, Clone, Default)]
pub struct PulseAnimation {
    started_at: Option<Instant>,
}

impl PulseAnimation {
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// Stop pulsing; opacity is back to 1.0 immediately
    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    pub fn opacity(&self, now: Instant) -> f32 {
        let Some(started_at) = self.started_at else {
            return 1.0;
        };

        let half = RECORD_PULSE_HALF_PERIOD.as_secs_f32();
        let elapsed = now.saturating_duration_since(started_at).as_secs_f32();
        let phase = (elapsed % (2.0 * half)) / half;
        let span = 1.0 - RECORD_PULSE_MIN_OPACITY;

        if phase <= 1.0 {
            1.0 - span * phase
        } else {
            RECORD_PULSE_MIN_OPACITY + span * (phase - 1.0)
        }
    }
}

/// Switch-camera button rotation around its vertical axis
#[derive(Debug, Clone, PartialEq)]
pub struct FlipAnimation {
    from: f32,
    to: f32,
    started_at: Instant,
    duration: Duration,
}

impl FlipAnimation {
    pub fn new(from: f32, to: f32, started_at: Instant) -> Self {
        Self {
            from,
            to,
            started_at,
            duration: LENS_FLIP_DURATION,
        }
    }

    /// Rotation in degrees at `now`, linear between `from` and `to`
    pub fn angle(&self, now: Instant) -> f32 {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(self.started_at).as_secs_f32()
                / self.duration.as_secs_f32())
            .clamp(0.0, 1.0)
        };
        self.from + (self.to - self.from) * progress
    }

    /// Resting rotation once finished
    pub fn end_angle(&self) -> f32 {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_reaches_minimum_after_half_period() {
        let start = Instant::now();
        let mut pulse = PulseAnimation::default();
        pulse.start(start);

        assert_eq!(pulse.opacity(start), 1.0);
        let low = pulse.opacity(start + RECORD_PULSE_HALF_PERIOD);
        assert!((low - RECORD_PULSE_MIN_OPACITY).abs() < 1e-4);
        let back = pulse.opacity(start + RECORD_PULSE_HALF_PERIOD * 2);
        assert!((back - 1.0).abs() < 1e-4);
    }

    #[test]
    fn cancelled_pulse_is_fully_opaque() {
        let start = Instant::now();
        let mut pulse = PulseAnimation::default();
        pulse.start(start);
        pulse.cancel();

        assert_eq!(pulse.opacity(start + RECORD_PULSE_HALF_PERIOD), 1.0);
    }

    #[test]
    fn flip_interpolates_and_clamps() {
        let start = Instant::now();
        let flip = FlipAnimation::new(180.0, 0.0, start);

        assert_eq!(flip.angle(start), 180.0);
        assert!((flip.angle(start + LENS_FLIP_DURATION / 2) - 90.0).abs() < 0.5);
        assert_eq!(flip.angle(start + LENS_FLIP_DURATION * 3), 0.0);
        assert_eq!(flip.end_angle(), 0.0);
    }
}
