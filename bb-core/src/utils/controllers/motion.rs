//! Open-loop motion for the two-wheel Brainybot.
//!
//! Every timed move is the same three steps: send the start frame, pause for
//! the computed hold time, send the hard-stop frame. Input is validated before
//! the first byte goes out. The stop frame is sent even when the start frame
//! failed, and the start error is the one returned.

use embedded_hal::{delay::DelayNs, i2c::I2c};

use super::{
    error::DeviceError,
    peripheral::{MotorCommand, Peripheral},
};
use crate::utils::math::kinematics::{split_signed, to_pause_ms, SpeedProfile};

/// Timed and continuous differential drive over the peripheral's motor register.
pub struct MotionController<I2C, D> {
    peripheral: Peripheral<I2C>,
    delay: D,
    profile: SpeedProfile,
}

impl<I2C, D> MotionController<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(
        peripheral: Peripheral<I2C>,
        delay: D,
        profile: SpeedProfile,
    ) -> Self {
        Self {
            peripheral,
            delay,
            profile,
        }
    }

    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }

    /// Drive straight ahead for `distance` linear units.
    pub fn drive_forward(
        &mut self,
        distance: f32,
        speed: u8,
    ) -> Result<(), DeviceError> {
        let ms = to_pause_ms(self.profile.duration_for_distance(distance, speed)?);
        tracing::info!(distance, speed, ms, "forward");
        self.drive_timed(speed as i16, speed as i16, ms)
    }

    /// Drive straight back for `distance` linear units.
    pub fn drive_backward(
        &mut self,
        distance: f32,
        speed: u8,
    ) -> Result<(), DeviceError> {
        let ms = to_pause_ms(self.profile.duration_for_distance(distance, speed)?);
        tracing::info!(distance, speed, ms, "backward");
        self.drive_timed(-(speed as i16), -(speed as i16), ms)
    }

    /// Spin in place counter-clockwise: left wheel back, right wheel forward.
    pub fn turn_left(
        &mut self,
        angle: f32,
        speed: u8,
    ) -> Result<(), DeviceError> {
        let ms = to_pause_ms(self.profile.duration_for_angle(angle, speed)?);
        tracing::info!(angle, speed, ms, "turn left");
        self.drive_timed(-(speed as i16), speed as i16, ms)
    }

    /// Spin in place clockwise: left wheel forward, right wheel back.
    pub fn turn_right(
        &mut self,
        angle: f32,
        speed: u8,
    ) -> Result<(), DeviceError> {
        let ms = to_pause_ms(self.profile.duration_for_angle(angle, speed)?);
        tracing::info!(angle, speed, ms, "turn right");
        self.drive_timed(speed as i16, -(speed as i16), ms)
    }

    /// Run each wheel at a signed speed (`-100..=100`) for `duration_ms`, then stop.
    ///
    /// Blocks for the whole duration. Exactly one start and one stop frame are
    /// written.
    pub fn drive_timed(
        &mut self,
        left: i16,
        right: i16,
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        let cmd = signed_command(left, right)?;

        let started = self.peripheral.write_motor_command(&cmd);
        if let Err(e) = &started {
            tracing::warn!("start command failed ({}), stopping anyway", e);
        }
        self.delay.delay_ms(duration_ms);
        let stopped = self.stop();

        started.and(stopped)
    }

    /// Run each wheel at a signed speed and return immediately.
    ///
    /// The motors keep turning until another command overrides them, e.g.
    /// `drive_continuous(0, 0)` or [`stop`](Self::stop).
    pub fn drive_continuous(
        &mut self,
        left: i16,
        right: i16,
    ) -> Result<(), DeviceError> {
        let cmd = signed_command(left, right)?;
        tracing::info!(left, right, "continuous drive");
        self.peripheral.write_motor_command(&cmd)
    }

    /// Zero both wheel speeds.
    pub fn stop(&mut self) -> Result<(), DeviceError> {
        self.peripheral.write_motor_command(&MotorCommand::STOP)
    }

    /// Release the peripheral driver and delay.
    pub fn release(self) -> (Peripheral<I2C>, D) {
        (self.peripheral, self.delay)
    }
}

fn signed_command(
    left: i16,
    right: i16,
) -> Result<MotorCommand, DeviceError> {
    let (left_direction, left_speed) = split_signed(left)?;
    let (right_direction, right_speed) = split_signed(right)?;
    Ok(MotorCommand {
        left_direction,
        left_speed,
        right_direction,
        right_speed,
    })
}
