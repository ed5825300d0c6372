//! Error types shared by every Brainybot controller.
//!
//! Interface failures are reduced to their embedded-hal `ErrorKind` at the
//! boundary so a single, non-generic [`DeviceError`] flows through the core.

use core::fmt;

use embedded_hal::{digital, i2c, pwm};

/// Caller supplied a value outside the operation's domain.
///
/// Always raised before any bus or pin I/O is attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// Distance or angle was negative, NaN or infinite.
    InvalidMagnitude(f32),
    /// Commanded speed of zero makes the hold duration indeterminate.
    IndeterminateDuration,
    /// Speed magnitude above 100.
    SpeedOutOfRange(i16),
    /// Servo angle above 180 degrees.
    AngleOutOfRange(u8),
    /// Calibration constants must be finite and strictly positive.
    InvalidCalibration,
}

/// The interface that failed, with the embedded-hal error kind it reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    I2c(i2c::ErrorKind),
    Pin(digital::ErrorKind),
    Pwm(pwm::ErrorKind),
}

/// Errors that can occur when driving the robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceError {
    Validation(ValidationError),
    Communication(Fault),
}

impl DeviceError {
    pub(crate) fn i2c<E: i2c::Error>(e: E) -> Self {
        DeviceError::Communication(Fault::I2c(e.kind()))
    }

    pub(crate) fn pin<E: digital::Error>(e: E) -> Self {
        DeviceError::Communication(Fault::Pin(e.kind()))
    }

    pub(crate) fn pwm<E: pwm::Error>(e: E) -> Self {
        DeviceError::Communication(Fault::Pwm(e.kind()))
    }

    /// `true` for out-of-domain input, `false` for interface failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, DeviceError::Validation(_))
    }
}

impl From<ValidationError> for DeviceError {
    fn from(e: ValidationError) -> Self {
        DeviceError::Validation(e)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ValidationError::InvalidMagnitude(v) => {
                write!(f, "magnitude {} must be finite and non-negative", v)
            }
            ValidationError::IndeterminateDuration => {
                write!(f, "zero speed gives an indeterminate duration")
            }
            ValidationError::SpeedOutOfRange(s) => write!(f, "speed {} outside -100..=100", s),
            ValidationError::AngleOutOfRange(a) => write!(f, "servo angle {} outside 0..=180", a),
            ValidationError::InvalidCalibration => {
                write!(f, "calibration constants must be positive")
            }
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            DeviceError::Validation(e) => write!(f, "validation error: {}", e),
            DeviceError::Communication(Fault::I2c(kind)) => write!(f, "i2c error: {:?}", kind),
            DeviceError::Communication(Fault::Pin(kind)) => write!(f, "pin error: {:?}", kind),
            DeviceError::Communication(Fault::Pwm(kind)) => write!(f, "pwm error: {:?}", kind),
        }
    }
}

impl core::error::Error for ValidationError {}

impl core::error::Error for DeviceError {}
