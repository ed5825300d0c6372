//! Dead-reckoning kinematics for the two-wheel Brainybot.
//!
//! `SpeedProfile` holds how far (and how many degrees) the robot travels in one
//! second at full commanded speed. Hold durations scale linearly with the
//! commanded speed; no feedback is involved.
//!
//! # Example
//! ```rust
//! use bb_core::utils::math::kinematics::SpeedProfile;
//! let profile = SpeedProfile::default();
//! let ms = profile.duration_for_angle(90.0, 100).unwrap();
//! assert!((ms - 375.0).abs() < 1e-3);
//! ```
//!
use serde::{Deserialize, Serialize};

use crate::utils::controllers::{error::ValidationError, peripheral::MotorDirection};

/// Linear units covered per second at full commanded speed.
pub const DEFAULT_LINEAR_SPEED: f32 = 8.5;
/// Degrees turned per second at full commanded speed, spinning in place.
pub const DEFAULT_ANGULAR_SPEED: f32 = 240.0;
/// Highest commanded speed accepted by the motor controller.
pub const FULL_SPEED: u8 = 100;

/// Calibration of commanded speed against physical motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct SpeedProfile {
    /// Linear units per second at speed 100.
    linear: f32,
    /// Degrees per second at speed 100.
    angular: f32,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            linear: DEFAULT_LINEAR_SPEED,
            angular: DEFAULT_ANGULAR_SPEED,
        }
    }
}

#[derive(Deserialize)]
struct RawProfile {
    linear: f32,
    angular: f32,
}

impl TryFrom<RawProfile> for SpeedProfile {
    type Error = ValidationError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        SpeedProfile::new(raw.linear, raw.angular)
    }
}

impl SpeedProfile {
    /// Instantiate with explicit calibration; both values must be finite and > 0.
    pub fn new(
        linear: f32,
        angular: f32,
    ) -> Result<Self, ValidationError> {
        if !(linear.is_finite() && linear > 0.0 && angular.is_finite() && angular > 0.0) {
            return Err(ValidationError::InvalidCalibration);
        }
        Ok(Self { linear, angular })
    }

    pub fn linear(&self) -> f32 {
        self.linear
    }

    pub fn angular(&self) -> f32 {
        self.angular
    }

    /// Milliseconds needed to cover `distance` at `speed` (1..=100).
    pub fn duration_for_distance(
        &self,
        distance: f32,
        speed: u8,
    ) -> Result<f32, ValidationError> {
        hold_duration(distance, speed, self.linear)
    }

    /// Milliseconds needed to turn `angle` degrees at `speed` (1..=100).
    pub fn duration_for_angle(
        &self,
        angle: f32,
        speed: u8,
    ) -> Result<f32, ValidationError> {
        hold_duration(angle, speed, self.angular)
    }
}

/// `magnitude / ((speed / 100) * per_second / 1000)`
fn hold_duration(
    magnitude: f32,
    speed: u8,
    per_second: f32,
) -> Result<f32, ValidationError> {
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(ValidationError::InvalidMagnitude(magnitude));
    }
    if speed == 0 {
        return Err(ValidationError::IndeterminateDuration);
    }
    if speed > FULL_SPEED {
        return Err(ValidationError::SpeedOutOfRange(speed as i16));
    }
    let units_per_ms = (speed as f32 / 100.0) * per_second / 1000.0;
    Ok(magnitude / units_per_ms)
}

/// Round a hold duration to the whole milliseconds handed to the pause primitive.
pub fn to_pause_ms(duration: f32) -> u32 {
    // `as` saturates, so oversized durations clamp to u32::MAX.
    libm::roundf(duration) as u32
}

/// Split a signed wheel speed into its direction tag and magnitude.
pub fn split_signed(speed: i16) -> Result<(MotorDirection, u8), ValidationError> {
    let magnitude = speed.unsigned_abs();
    if magnitude > FULL_SPEED as u16 {
        return Err(ValidationError::SpeedOutOfRange(speed));
    }
    let direction = if speed < 0 {
        MotorDirection::Backward
    } else {
        MotorDirection::Forward
    };
    Ok((direction, magnitude as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_matches_closed_form() {
        let kin = SpeedProfile::default();
        for speed in 1..=100u8 {
            for &distance in &[0.0f32, 0.5, 12.0, 100.0] {
                let got = kin.duration_for_distance(distance, speed).unwrap();
                let expected = distance * 1000.0 * 100.0 / (speed as f32 * DEFAULT_LINEAR_SPEED);
                assert!(
                    libm::fabsf(got - expected) <= expected * 1e-5 + 1e-6,
                    "speed {} distance {}: {} != {}",
                    speed,
                    distance,
                    got,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_duration_non_increasing_in_speed() {
        let kin = SpeedProfile::default();
        let mut previous = f32::INFINITY;
        for speed in 1..=100u8 {
            let d = kin.duration_for_distance(30.0, speed).unwrap();
            assert!(d <= previous, "speed {} increased duration", speed);
            previous = d;
        }
    }

    #[test]
    fn test_zero_magnitude_iff_zero_duration() {
        let kin = SpeedProfile::default();
        assert_eq!(kin.duration_for_distance(0.0, 37).unwrap(), 0.0);
        assert_eq!(kin.duration_for_angle(0.0, 100).unwrap(), 0.0);
        assert!(kin.duration_for_distance(0.01, 100).unwrap() > 0.0);
        assert!(kin.duration_for_angle(1.0, 1).unwrap() > 0.0);
    }

    #[test]
    fn test_forward_scenario() {
        let kin = SpeedProfile::default();
        let d = kin.duration_for_distance(12.0, 100).unwrap();
        assert!(libm::fabsf(d - 1411.7647) < 1e-2);
        assert_eq!(to_pause_ms(d), 1412);
    }

    #[test]
    fn test_angle_scenario() {
        let kin = SpeedProfile::default();
        let d = kin.duration_for_angle(90.0, 100).unwrap();
        assert!(libm::fabsf(d - 375.0) < 1e-3);
        assert_eq!(to_pause_ms(d), 375);
        // Half speed doubles the hold time.
        let half = kin.duration_for_angle(90.0, 50).unwrap();
        assert!(libm::fabsf(half - 750.0) < 1e-3);
    }

    #[test]
    fn test_alternate_calibration() {
        let kin = SpeedProfile::new(10.0, 180.0).unwrap();
        assert!(libm::fabsf(kin.duration_for_distance(5.0, 100).unwrap() - 500.0) < 1e-3);
        assert!(libm::fabsf(kin.duration_for_angle(90.0, 100).unwrap() - 500.0) < 1e-3);
    }

    #[test]
    fn test_rejects_bad_input() {
        let kin = SpeedProfile::default();
        assert_eq!(
            kin.duration_for_distance(10.0, 0),
            Err(ValidationError::IndeterminateDuration)
        );
        assert_eq!(
            kin.duration_for_distance(-1.0, 100),
            Err(ValidationError::InvalidMagnitude(-1.0))
        );
        assert!(kin.duration_for_angle(f32::NAN, 100).is_err());
        assert!(kin.duration_for_angle(f32::INFINITY, 100).is_err());
        assert_eq!(
            kin.duration_for_angle(10.0, 101),
            Err(ValidationError::SpeedOutOfRange(101))
        );
    }

    #[test]
    fn test_rejects_bad_calibration() {
        assert!(SpeedProfile::new(0.0, 240.0).is_err());
        assert!(SpeedProfile::new(8.5, -1.0).is_err());
        assert!(SpeedProfile::new(f32::NAN, 240.0).is_err());
    }

    #[test]
    fn test_split_signed() {
        assert_eq!(split_signed(0), Ok((MotorDirection::Forward, 0)));
        assert_eq!(split_signed(55), Ok((MotorDirection::Forward, 55)));
        assert_eq!(split_signed(-100), Ok((MotorDirection::Backward, 100)));
        assert_eq!(split_signed(101), Err(ValidationError::SpeedOutOfRange(101)));
        assert_eq!(split_signed(i16::MIN), Err(ValidationError::SpeedOutOfRange(i16::MIN)));
    }
}
