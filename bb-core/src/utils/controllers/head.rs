//! Servo-driven sensor head.

use embedded_hal::pwm::{self, SetDutyCycle};

use super::error::{DeviceError, ValidationError};

pub const MAX_ANGLE: u8 = 180;
pub const CENTER_ANGLE: u8 = 90;

/// A servo output that accepts an angle in degrees, unscaled.
pub trait ServoOutput {
    type Error: pwm::Error;

    fn write_angle(
        &mut self,
        degrees: u8,
    ) -> Result<(), Self::Error>;
}

impl<T: ServoOutput + ?Sized> ServoOutput for &mut T {
    type Error = T::Error;

    fn write_angle(
        &mut self,
        degrees: u8,
    ) -> Result<(), Self::Error> {
        (**self).write_angle(degrees)
    }
}

/// Hobby servo on a 50 Hz PWM channel: 0° = 500 µs, 180° = 2500 µs.
pub struct PwmServo<P> {
    pwm: P,
}

const PERIOD_US: u16 = 20_000;
const MIN_PULSE_US: u16 = 500;
const PULSE_SPAN_US: u16 = 2_000;

impl<P: SetDutyCycle> PwmServo<P> {
    /// `pwm` must already run at 50 Hz.
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> ServoOutput for PwmServo<P> {
    type Error = P::Error;

    fn write_angle(
        &mut self,
        degrees: u8,
    ) -> Result<(), Self::Error> {
        let degrees = degrees.min(MAX_ANGLE) as u32;
        let pulse = MIN_PULSE_US as u32 + degrees * PULSE_SPAN_US as u32 / MAX_ANGLE as u32;
        self.pwm.set_duty_cycle_fraction(pulse as u16, PERIOD_US)
    }
}

/// Points the range sensor.
pub struct SensorHead<S> {
    servo: S,
}

impl<S: ServoOutput> SensorHead<S> {
    pub fn new(servo: S) -> Self {
        Self { servo }
    }

    /// Turn the head to `angle` degrees (0..=180, 90 is straight ahead).
    pub fn point(
        &mut self,
        angle: u8,
    ) -> Result<(), DeviceError> {
        if angle > MAX_ANGLE {
            return Err(ValidationError::AngleOutOfRange(angle).into());
        }
        tracing::debug!(angle, "head");
        self.servo.write_angle(angle).map_err(DeviceError::pwm)
    }

    pub fn center(&mut self) -> Result<(), DeviceError> {
        self.point(CENTER_ANGLE)
    }
}
