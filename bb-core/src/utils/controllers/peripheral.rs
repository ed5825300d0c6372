//! Register-level access to the Brainybot peripheral controller.
//!
//! Every transaction is a single addressed I2C write, or a register-select
//! write followed by a read. Nothing is retried: a failed motor write is
//! reported as-is so the caller's timing stays in step with the hardware.

use embedded_hal::i2c::I2c;
use serde::{Deserialize, Serialize};

use super::error::DeviceError;

/// Fixed bus address of the peripheral controller.
pub const PERIPHERAL_ADDRESS: u8 = 0x10;

/// Register map of the peripheral controller.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Start of the motor block: left dir, left speed, right dir, right speed.
    Motor = 0x00,
    LeftLed = 0x0b,
    RightLed = 0x0c,
    /// One bit per ground sensor.
    LineState = 0x1d,
    /// Number of bytes in the firmware version string.
    VersionCount = 0x32,
    VersionData = 0x33,
}

/// Motor rotation direction, encoded as the wire tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorDirection {
    #[default]
    Forward = 0,
    Backward = 1,
}

/// One command for both wheels. Speeds are magnitudes in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    pub left_direction: MotorDirection,
    pub left_speed: u8,
    pub right_direction: MotorDirection,
    pub right_speed: u8,
}

impl MotorCommand {
    /// Zero speed on both wheels. Direction tags are reset to forward.
    pub const STOP: MotorCommand = MotorCommand {
        left_direction: MotorDirection::Forward,
        left_speed: 0,
        right_direction: MotorDirection::Forward,
        right_speed: 0,
    };

    /// Wire frame: `[register, left dir, left speed, right dir, right speed]`.
    pub fn to_frame(&self) -> [u8; 5] {
        [
            Register::Motor as u8,
            self.left_direction as u8,
            self.left_speed,
            self.right_direction as u8,
            self.right_speed,
        ]
    }
}

/// Head LED position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedSide {
    Left,
    Right,
}

impl LedSide {
    fn register(self) -> Register {
        match self {
            LedSide::Left => Register::LeftLed,
            LedSide::Right => Register::RightLed,
        }
    }
}

/// Byte-level driver for the peripheral controller.
pub struct Peripheral<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Peripheral<I2C> {
    /// Create a driver at the default address (0x10).
    pub fn new(i2c: I2C) -> Self {
        Self::new_with_address(i2c, PERIPHERAL_ADDRESS)
    }

    pub fn new_with_address(
        i2c: I2C,
        address: u8,
    ) -> Self {
        Self { i2c, address }
    }

    /// Send a motor command frame. Takes effect immediately, no acknowledgement.
    pub fn write_motor_command(
        &mut self,
        cmd: &MotorCommand,
    ) -> Result<(), DeviceError> {
        let frame = cmd.to_frame();
        tracing::debug!(?frame, "motor frame");
        self.i2c
            .write(self.address, &frame)
            .map_err(DeviceError::i2c)
    }

    /// Select `register` and read back one byte.
    pub fn read_register(
        &mut self,
        register: Register,
    ) -> Result<u8, DeviceError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register as u8], &mut buf)
            .map_err(DeviceError::i2c)?;
        tracing::debug!("register 0x{:02X} = 0x{:02X}", register as u8, buf[0]);
        Ok(buf[0])
    }

    /// Switch one head LED on or off.
    pub fn set_led(
        &mut self,
        side: LedSide,
        on: bool,
    ) -> Result<(), DeviceError> {
        self.i2c
            .write(self.address, &[side.register() as u8, on as u8])
            .map_err(DeviceError::i2c)
    }

    /// Read the firmware version string into `buf`.
    ///
    /// Returns the number of bytes written, which is the advertised length
    /// truncated to `buf.len()`.
    pub fn read_version(
        &mut self,
        buf: &mut [u8],
    ) -> Result<usize, DeviceError> {
        let count = self.read_register(Register::VersionCount)? as usize;
        let len = count.min(buf.len());
        if len == 0 {
            return Ok(0);
        }
        self.i2c
            .write_read(
                self.address,
                &[Register::VersionData as u8],
                &mut buf[..len],
            )
            .map_err(DeviceError::i2c)?;
        Ok(len)
    }

    /// Release the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}
