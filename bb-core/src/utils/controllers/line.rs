//! Ground line sensors.
//!
//! The five downward-facing sensors share one register; a set bit means the
//! sensor sees black.

use embedded_hal::i2c::I2c;
use serde::{Deserialize, Serialize};

use super::{
    error::DeviceError,
    peripheral::{Peripheral, Register},
};

/// Physical sensor positions, left to right.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundSensor {
    L2,
    L1,
    M,
    R1,
    R2,
}

/// Bit of each sensor in the line-state register, indexed by `GroundSensor`.
const SENSOR_MASKS: [u8; 5] = [0x10, 0x08, 0x04, 0x02, 0x01];

impl GroundSensor {
    pub const ALL: [GroundSensor; 5] = [
        GroundSensor::L2,
        GroundSensor::L1,
        GroundSensor::M,
        GroundSensor::R1,
        GroundSensor::R2,
    ];

    pub fn mask(self) -> u8 {
        SENSOR_MASKS[self as usize]
    }
}

/// One snapshot of the line-state register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineState(pub u8);

impl LineState {
    pub fn is_black(
        &self,
        sensor: GroundSensor,
    ) -> bool {
        self.0 & sensor.mask() != 0
    }

    pub fn is_white(
        &self,
        sensor: GroundSensor,
    ) -> bool {
        !self.is_black(sensor)
    }
}

/// Reads the line-state register on demand.
pub struct LineSensor<I2C> {
    peripheral: Peripheral<I2C>,
}

impl<I2C: I2c> LineSensor<I2C> {
    pub fn new(peripheral: Peripheral<I2C>) -> Self {
        Self { peripheral }
    }

    pub fn read_state(&mut self) -> Result<LineState, DeviceError> {
        self.peripheral
            .read_register(Register::LineState)
            .map(LineState)
    }

    /// One register read, then a bit test.
    pub fn is_black(
        &mut self,
        sensor: GroundSensor,
    ) -> Result<bool, DeviceError> {
        Ok(self.read_state()?.is_black(sensor))
    }

    /// Complement of [`is_black`](Self::is_black) from a single read.
    pub fn is_white(
        &mut self,
        sensor: GroundSensor,
    ) -> Result<bool, DeviceError> {
        self.is_black(sensor).map(|black| !black)
    }

    pub fn release(self) -> Peripheral<I2C> {
        self.peripheral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_are_distinct_single_bits() {
        let mut seen = 0u8;
        for s in GroundSensor::ALL {
            assert_eq!(s.mask().count_ones(), 1);
            assert_eq!(seen & s.mask(), 0, "{:?} reuses a bit", s);
            seen |= s.mask();
        }
        assert_eq!(seen, 0x1F);
    }

    #[test]
    fn test_single_bit_round_trip() {
        for target in GroundSensor::ALL {
            let state = LineState(target.mask());
            for s in GroundSensor::ALL {
                assert_eq!(state.is_black(s), s == target, "{:?} in {:?}", s, state);
            }
        }
    }

    #[test]
    fn test_all_zero_and_all_ones() {
        for s in GroundSensor::ALL {
            assert!(LineState(0x00).is_white(s));
            assert!(LineState(0xFF).is_black(s));
        }
    }

    #[test]
    fn test_white_is_complement_for_every_byte() {
        for byte in 0..=u8::MAX {
            let state = LineState(byte);
            for s in GroundSensor::ALL {
                assert_eq!(state.is_white(s), !state.is_black(s));
            }
        }
    }

    #[test]
    fn test_mapping() {
        assert_eq!(GroundSensor::L2.mask(), 0x10);
        assert_eq!(GroundSensor::L1.mask(), 0x08);
        assert_eq!(GroundSensor::M.mask(), 0x04);
        assert_eq!(GroundSensor::R1.mask(), 0x02);
        assert_eq!(GroundSensor::R2.mask(), 0x01);
    }
}
