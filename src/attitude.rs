use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Device orientation in a fixed world frame, angles in radians.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSample {
    pub roll: f32,
    pub pitch: f32,
    #[serde(default)]
    pub yaw: f32,
    pub timestamp: f32, // in seconds
}

impl AttitudeSample {
    #[inline]
    pub fn new(roll: f32, pitch: f32, yaw: f32, timestamp: f32) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            timestamp,
        }
    }

    #[inline]
    pub fn rotation(&self) -> na::UnitQuaternion<f32> {
        na::UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw)
    }
}

/// Orientation captured once and used as the zero for every later sample.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceAttitude {
    inverse: na::UnitQuaternion<f32>,
    pub captured_at: f32,
}

impl ReferenceAttitude {
    pub fn new(sample: &AttitudeSample) -> Self {
        Self {
            inverse: sample.rotation().inverse(),
            captured_at: sample.timestamp,
        }
    }

    /// `(roll, pitch)` of `sample` relative to this reference, in degrees.
    pub fn relative_degrees(&self, sample: &AttitudeSample) -> (f32, f32) {
        let (roll, pitch, _) = (self.inverse * sample.rotation()).euler_angles();

        (roll.to_degrees(), pitch.to_degrees())
    }
}
