//! Ultrasonic range sensor on the sensor head.
//!
//! A 10 µs trigger pulse starts a ping; the echo line then stays high for the
//! round-trip time. No echo within the timeout is a normal outcome and is
//! reported as [`RangeReading::NoEcho`], not as an error.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use serde::Serialize;

use super::error::DeviceError;

/// Echo microseconds per linear unit of distance, round trip included.
pub const PULSE_US_PER_UNIT: f32 = 148.0;
/// Longest echo wait before a measurement counts as no-echo.
pub const ECHO_TIMEOUT_US: u32 = 30_000;
/// Numeric stand-in for "nothing in range".
pub const NO_ECHO_DISTANCE: f32 = 999.0;
/// Quiet time after each ping so the next trigger does not pick up stale echoes.
pub const SETTLE_MS: u32 = 10;

const TRIGGER_SETTLE_US: u32 = 2;
const TRIGGER_PULSE_US: u32 = 10;

/// Result of one ping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeReading {
    Distance(f32),
    NoEcho,
}

impl RangeReading {
    /// Convert a measured echo width. Zero means the timeout elapsed.
    pub fn from_pulse_us(pulse_us: u32) -> Self {
        if pulse_us == 0 {
            RangeReading::NoEcho
        } else {
            RangeReading::Distance(pulse_us as f32 / PULSE_US_PER_UNIT)
        }
    }

    /// Distance in linear units, with [`NO_ECHO_DISTANCE`] for no echo.
    pub fn as_units(self) -> f32 {
        match self {
            RangeReading::Distance(d) => d,
            RangeReading::NoEcho => NO_ECHO_DISTANCE,
        }
    }

    pub fn distance(self) -> Option<f32> {
        match self {
            RangeReading::Distance(d) => Some(d),
            RangeReading::NoEcho => None,
        }
    }
}

/// Measures the width of the next high pulse on an input.
pub trait EchoPulse {
    type Error: embedded_hal::digital::Error;

    /// Width of the next high pulse in microseconds, or 0 if it did not start
    /// and finish within `timeout_us`. A pulse already high on entry is skipped.
    fn pulse_width_us(
        &mut self,
        timeout_us: u32,
    ) -> Result<u32, Self::Error>;
}

/// [`EchoPulse`] by polling an input pin at a fixed step.
///
/// Resolution is `step_us`; loop overhead is not accounted for.
pub struct PollingEcho<P, D> {
    pin: P,
    delay: D,
    step_us: u32,
}

impl<P, D> PollingEcho<P, D>
where
    P: InputPin,
    D: DelayNs,
{
    pub fn new(
        pin: P,
        delay: D,
        step_us: u32,
    ) -> Self {
        Self {
            pin,
            delay,
            step_us: step_us.max(1),
        }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D> EchoPulse for PollingEcho<P, D>
where
    P: InputPin,
    D: DelayNs,
{
    type Error = P::Error;

    fn pulse_width_us(
        &mut self,
        timeout_us: u32,
    ) -> Result<u32, Self::Error> {
        let mut elapsed = 0u32;
        // A pulse already in progress belongs to an earlier ping.
        while self.pin.is_high()? {
            if elapsed >= timeout_us {
                return Ok(0);
            }
            self.delay.delay_us(self.step_us);
            elapsed = elapsed.saturating_add(self.step_us);
        }

        while self.pin.is_low()? {
            if elapsed >= timeout_us {
                return Ok(0);
            }
            self.delay.delay_us(self.step_us);
            elapsed = elapsed.saturating_add(self.step_us);
        }

        let mut width = 0u32;
        while self.pin.is_high()? {
            if elapsed >= timeout_us {
                return Ok(0);
            }
            self.delay.delay_us(self.step_us);
            elapsed = elapsed.saturating_add(self.step_us);
            width += self.step_us;
        }
        Ok(width)
    }
}

/// Anything that can take a range reading.
pub trait RangeFinder {
    fn sense(&mut self) -> Result<RangeReading, DeviceError>;

    /// Numeric form of [`sense`](Self::sense): no echo becomes [`NO_ECHO_DISTANCE`].
    fn sense_distance(&mut self) -> Result<f32, DeviceError> {
        self.sense().map(RangeReading::as_units)
    }
}

/// Trigger/echo ultrasonic ranger.
pub struct Sonar<T, E, D> {
    trigger: T,
    echo: E,
    delay: D,
}

impl<T, E, D> Sonar<T, E, D>
where
    T: OutputPin,
    E: EchoPulse,
    D: DelayNs,
{
    pub fn new(
        trigger: T,
        echo: E,
        delay: D,
    ) -> Self {
        Self {
            trigger,
            echo,
            delay,
        }
    }

    fn fire(&mut self) -> Result<(), DeviceError> {
        self.trigger.set_low().map_err(DeviceError::pin)?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high().map_err(DeviceError::pin)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low().map_err(DeviceError::pin)
    }

    pub fn release(self) -> (T, E, D) {
        (self.trigger, self.echo, self.delay)
    }
}

impl<T, E, D> RangeFinder for Sonar<T, E, D>
where
    T: OutputPin,
    E: EchoPulse,
    D: DelayNs,
{
    fn sense(&mut self) -> Result<RangeReading, DeviceError> {
        let pulse = self.fire().and_then(|()| {
            self.echo
                .pulse_width_us(ECHO_TIMEOUT_US)
                .map_err(DeviceError::pin)
        });
        // Settle after every ping, failed ones included.
        self.delay.delay_ms(SETTLE_MS);

        let reading = RangeReading::from_pulse_us(pulse?);
        tracing::debug!(?reading, "ping");
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_conversion() {
        assert_eq!(RangeReading::from_pulse_us(1480), RangeReading::Distance(10.0));
        assert_eq!(RangeReading::from_pulse_us(148).as_units(), 1.0);
        assert_eq!(RangeReading::from_pulse_us(74).distance(), Some(0.5));
    }

    #[test]
    fn test_no_echo_sentinel() {
        let reading = RangeReading::from_pulse_us(0);
        assert_eq!(reading, RangeReading::NoEcho);
        assert_eq!(reading.as_units(), NO_ECHO_DISTANCE);
        assert_eq!(reading.distance(), None);
    }

    #[test]
    fn test_sentinel_beyond_measurable_range() {
        let farthest = RangeReading::from_pulse_us(ECHO_TIMEOUT_US).as_units();
        assert!(NO_ECHO_DISTANCE > farthest);
    }
}
