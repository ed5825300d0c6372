//! Module Exports
//!
//! This file exports the device controllers and the command dispatcher.
//!
//! - `peripheral`: register-level access to the I2C peripheral controller.
//! - `motion`: timed and continuous differential drive.
//! - `line`: ground line sensor decoding.
//! - `sonar`: ultrasonic range measurement.
//! - `head`: sensor head servo.
//!
//! All bus-attached controllers share one I2C bus through `RefCellDevice`.
//! Commands arrive on `COMMAND_CHANNEL` and are executed one at a time by the
//! task that owns the `SystemController`, which serialises bus access.

pub mod error;
pub mod head;
pub mod line;
pub mod motion;
pub mod peripheral;
pub mod sonar;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::{delay::DelayNs, i2c::I2c};
use embedded_hal_bus::i2c::RefCellDevice;
use serde::{Deserialize, Serialize};

pub use error::{DeviceError, Fault, ValidationError};
pub use head::{PwmServo, SensorHead, ServoOutput};
pub use line::{GroundSensor, LineSensor, LineState};
pub use motion::MotionController;
pub use peripheral::{LedSide, MotorCommand, MotorDirection, Peripheral};
pub use sonar::{EchoPulse, PollingEcho, RangeFinder, RangeReading, Sonar};

use crate::utils::math::kinematics::{
    SpeedProfile, DEFAULT_ANGULAR_SPEED, DEFAULT_LINEAR_SPEED, FULL_SPEED,
};

/// Channel used to receive `SystemCommand` messages.
pub static COMMAND_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    SystemCommand,
    16,
> = embassy_sync::channel::Channel::new();

fn full_speed() -> u8 {
    FULL_SPEED
}

/// Motion command variants. Speeds default to 100 when `s` is omitted.
///
/// Serialized as JSON with tag `"mc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "mc", rename_all = "snake_case")]
pub enum MotionCommand {
    /// Forward `d` linear units.
    F {
        d: f32,
        #[serde(default = "full_speed")]
        s: u8,
    },
    /// Backward `d` linear units.
    B {
        d: f32,
        #[serde(default = "full_speed")]
        s: u8,
    },
    /// Turn left `a` degrees.
    L {
        a: f32,
        #[serde(default = "full_speed")]
        s: u8,
    },
    /// Turn right `a` degrees.
    R {
        a: f32,
        #[serde(default = "full_speed")]
        s: u8,
    },
    /// Signed wheel speeds for `t` milliseconds, then stop.
    T { l: i16, r: i16, t: u32 },
    /// Signed wheel speeds until countermanded.
    C { l: i16, r: i16 },
    Stop,
}

/// Sensor command variants.
///
/// Serialized as JSON with tag `"sc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "sc", rename_all = "snake_case")]
pub enum SensorCommand {
    /// Full line-state register.
    Line,
    Black { g: GroundSensor },
    White { g: GroundSensor },
    /// One ultrasonic ping.
    Range,
    /// Point the sensor head.
    Head { a: u8 },
}

/// Head LED command variants.
///
/// Serialized as JSON with tag `"lc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "lc", rename_all = "snake_case")]
pub enum LedCommand {
    On { side: LedSide },
    Off { side: LedSide },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum SystemCommand {
    M(MotionCommand),
    S(SensorCommand),
    L(LedCommand),
}

/// Data returned by sensor commands.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(tag = "rd", rename_all = "snake_case")]
pub enum Reading {
    Line { state: LineState },
    Surface { sensor: GroundSensor, black: bool },
    Range { reading: RangeReading },
}

/// Owns every robot device and executes `SystemCommand`s against them.
pub struct SystemController<'a, I2C, D, R, S> {
    peripheral: Peripheral<RefCellDevice<'a, I2C>>,
    motion: MotionController<RefCellDevice<'a, I2C>, D>,
    line: LineSensor<RefCellDevice<'a, I2C>>,
    range: R,
    head: SensorHead<S>,
}

impl<'a, I2C, D, R, S> SystemController<'a, I2C, D, R, S>
where
    I2C: I2c,
    D: DelayNs,
    R: RangeFinder,
    S: ServoOutput,
{
    /// Create a controller over a shared bus.
    ///
    /// `linear` and `angular` override the default calibration
    /// (8.5 units/s and 240 °/s at full speed).
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        delay: D,
        range: R,
        servo: S,
        linear: Option<f32>,
        angular: Option<f32>,
    ) -> Result<Self, DeviceError> {
        let profile = SpeedProfile::new(
            linear.unwrap_or(DEFAULT_LINEAR_SPEED),
            angular.unwrap_or(DEFAULT_ANGULAR_SPEED),
        )?;

        Ok(SystemController {
            peripheral: Peripheral::new(RefCellDevice::new(i2c_bus)),
            motion: MotionController::new(
                Peripheral::new(RefCellDevice::new(i2c_bus)),
                delay,
                profile,
            ),
            line: LineSensor::new(Peripheral::new(RefCellDevice::new(i2c_bus))),
            range,
            head: SensorHead::new(servo),
        })
    }

    /// Put the robot in a known state: motors stopped, LEDs off, head centred.
    ///
    /// Logs the firmware version; a failed version read is only a warning.
    pub fn init(&mut self) -> Result<(), DeviceError> {
        self.motion.stop()?;
        self.peripheral.set_led(LedSide::Left, false)?;
        self.peripheral.set_led(LedSide::Right, false)?;
        self.head.center()?;

        let mut version = [0u8; 32];
        match self.peripheral.read_version(&mut version) {
            Ok(len) => match core::str::from_utf8(&version[..len]) {
                Ok(v) => tracing::info!(version = v, "peripheral ready"),
                Err(_) => tracing::info!(raw = ?&version[..len], "peripheral ready"),
            },
            Err(e) => tracing::warn!("version read failed: {}", e),
        }
        Ok(())
    }

    pub fn motion(&mut self) -> &mut MotionController<RefCellDevice<'a, I2C>, D> {
        &mut self.motion
    }

    /// Execute a single command.
    ///
    /// Returns sensor data for sensor reads, `None` otherwise.
    pub fn ex_command(
        &mut self,
        command: SystemCommand,
    ) -> Result<Option<Reading>, DeviceError> {
        match command {
            SystemCommand::M(m) => {
                self.ex_motion(m)?;
                Ok(None)
            }
            SystemCommand::S(s) => self.ex_sensor(s),
            SystemCommand::L(LedCommand::On { side }) => {
                self.peripheral.set_led(side, true)?;
                Ok(None)
            }
            SystemCommand::L(LedCommand::Off { side }) => {
                self.peripheral.set_led(side, false)?;
                Ok(None)
            }
        }
    }

    fn ex_motion(
        &mut self,
        command: MotionCommand,
    ) -> Result<(), DeviceError> {
        match command {
            MotionCommand::F { d, s } => self.motion.drive_forward(d, s),
            MotionCommand::B { d, s } => self.motion.drive_backward(d, s),
            MotionCommand::L { a, s } => self.motion.turn_left(a, s),
            MotionCommand::R { a, s } => self.motion.turn_right(a, s),
            MotionCommand::T { l, r, t } => self.motion.drive_timed(l, r, t),
            MotionCommand::C { l, r } => self.motion.drive_continuous(l, r),
            MotionCommand::Stop => self.motion.stop(),
        }
    }

    fn ex_sensor(
        &mut self,
        command: SensorCommand,
    ) -> Result<Option<Reading>, DeviceError> {
        let reading = match command {
            SensorCommand::Line => Reading::Line {
                state: self.line.read_state()?,
            },
            SensorCommand::Black { g } => Reading::Surface {
                sensor: g,
                black: self.line.is_black(g)?,
            },
            SensorCommand::White { g } => Reading::Surface {
                sensor: g,
                black: !self.line.is_white(g)?,
            },
            SensorCommand::Range => Reading::Range {
                reading: self.range.sense()?,
            },
            SensorCommand::Head { a } => {
                self.head.point(a)?;
                return Ok(None);
            }
        };
        Ok(Some(reading))
    }

    /// Drain `COMMAND_CHANNEL` forever, one command at a time.
    pub async fn run(&mut self) -> ! {
        loop {
            let command = COMMAND_CHANNEL.receiver().receive().await;
            tracing::info!("Received command: {:?}", command);
            match self.ex_command(command) {
                Ok(Some(reading)) => tracing::info!(?reading, "Sensor read"),
                Ok(None) => tracing::info!("Command executed successfully"),
                Err(e) => tracing::error!("Command failed: {}", e),
            }
        }
    }
}
