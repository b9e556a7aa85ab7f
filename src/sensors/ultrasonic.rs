//! HC-SR04 style ultrasonic level gauge.
//!
//! A 10 µs trigger pulse starts a ping; the echo pin stays high for the
//! round-trip time.  Water level is the tank height minus the measured
//! distance to the surface.
//!
//! The echo is timed by polling, so one sample blocks the calling task for
//! at most two [`ECHO_TIMEOUT_US`] windows.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::SensorSource;
use crate::error::SensorError;
use crate::types::Channel;

/// Longest wait for either echo edge (about 5 m of travel).
pub const ECHO_TIMEOUT_US: u64 = 30_000;

/// Speed of sound, cm per µs.
const SOUND_CM_PER_US: f32 = 0.034;

/// Water level (cm) for an echo pulse of `echo_us`.  Distance is truncated
/// to whole centimetres before subtracting.
pub fn level_from_echo(echo_us: u64, tank_height_cm: f32) -> f32 {
    let distance_cm = (echo_us as f32 * SOUND_CM_PER_US / 2.0).trunc();
    tank_height_cm - distance_cm
}

pub struct UltrasonicGauge<T, E, D> {
    channel: Channel,
    trig: T,
    echo: E,
    delay: D,
    /// Free-running microsecond counter.
    micros: fn() -> u64,
    tank_height_cm: f32,
}

impl<T: OutputPin, E: InputPin, D: DelayNs> UltrasonicGauge<T, E, D> {
    pub fn new(channel: Channel, trig: T, echo: E, delay: D, micros: fn() -> u64, tank_height_cm: f32) -> Self {
        Self {
            channel,
            trig,
            echo,
            delay,
            micros,
            tank_height_cm,
        }
    }

    fn ping(&mut self) -> Result<(), SensorError> {
        self.trig.set_low().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(2);
        self.trig.set_high().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(10);
        self.trig.set_low().map_err(|_| SensorError::GpioWriteFailed)
    }

    /// Wait until the echo pin reads `level`; returns the time it did.
    fn wait_for(&mut self, level: bool, since: u64) -> Result<u64, SensorError> {
        loop {
            let high = self.echo.is_high().map_err(|_| SensorError::GpioReadFailed)?;
            let now = (self.micros)();
            if high == level {
                return Ok(now);
            }
            if now.saturating_sub(since) > ECHO_TIMEOUT_US {
                return Err(SensorError::EchoTimeout);
            }
        }
    }

    /// Width of the echo pulse in µs.
    pub fn measure_echo_us(&mut self) -> Result<u64, SensorError> {
        self.ping()?;
        let start = (self.micros)();
        let rising = self.wait_for(true, start)?;
        let falling = self.wait_for(false, rising)?;
        Ok(falling.saturating_sub(rising))
    }
}

impl<T: OutputPin, E: InputPin, D: DelayNs> SensorSource for UltrasonicGauge<T, E, D> {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn sample(&mut self) -> Result<f32, SensorError> {
        let echo_us = self.measure_echo_us()?;
        Ok(level_from_echo(echo_us, self.tank_height_cm))
    }
}
