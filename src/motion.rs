//! Orientation delta tracking.
//!
//! Turns the attitude stream into small screen-space nudges. Every update is
//! relative to the previous sample only, nothing is recomputed from an
//! absolute position.

use crate::attitude::{AttitudeSample, ReferenceAttitude};

/// Display pixels per degree of rotation.
pub const DEFAULT_MOTION_GAIN: f32 = 3.0;

#[derive(Debug, Clone)]
pub struct OrientationDeltaTracker {
    gain: f32,
    reference: Option<ReferenceAttitude>,
    last_roll: f32,
    last_pitch: f32,
}

impl OrientationDeltaTracker {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            reference: None,
            last_roll: 0.0,
            last_pitch: 0.0,
        }
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn reference(&self) -> Option<&ReferenceAttitude> {
        self.reference.as_ref()
    }

    /// Sets the reference from `sample` unless one is already held.
    /// Returns whether this call captured it.
    pub fn capture_reference(&mut self, sample: &AttitudeSample) -> bool {
        if self.reference.is_some() {
            log::debug!("reference attitude already captured, ignoring");
            return false;
        }

        self.reference = Some(ReferenceAttitude::new(sample));
        log::info!(
            "reference attitude captured at {:.3}s (roll {:.3}, pitch {:.3})",
            sample.timestamp,
            sample.roll,
            sample.pitch
        );

        true
    }

    /// Screen delta `(dx, dy)` since the previous sample, or `None` without
    /// a reference.
    pub fn update(&mut self, sample: &AttitudeSample) -> Option<(f32, f32)> {
        let reference = self.reference.as_ref()?;
        let (roll, pitch) = reference.relative_degrees(sample);

        let dx = (roll - self.last_roll) * self.gain;
        let dy = (pitch - self.last_pitch) * self.gain;

        self.last_roll = roll;
        self.last_pitch = pitch;

        Some((dx, dy))
    }
}

impl Default for OrientationDeltaTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MOTION_GAIN)
    }
}
