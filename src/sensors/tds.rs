//! Analog TDS (total dissolved solids) sensor.
//!
//! Converts the sensor voltage to electrical conductivity with the
//! vendor's cubic fit, compensates to 25 °C, and halves it to get ppm.
//! No k-value calibration: the cell constant is fixed at 1.0.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 channel 7 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::SensorSource;
use crate::error::SensorError;
use crate::pins::{ADC_RANGE, ADC_VREF};
use crate::types::Channel;

#[cfg(not(target_os = "espidf"))]
static SIM_TDS_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_tds_adc(raw: u16) {
    SIM_TDS_ADC.store(raw, Ordering::Relaxed);
}

/// Water temperature assumed when no thermometer is fitted.
pub const DEFAULT_TEMPERATURE_C: f32 = 25.0;
/// Conductivity to TDS conversion factor.
const TDS_FACTOR: f32 = 0.5;

/// ppm for a raw 12-bit ADC count at `temperature_c`.
pub fn tds_from_adc(raw: u16, temperature_c: f32) -> f32 {
    let v = f32::from(raw) / ADC_RANGE * ADC_VREF;
    let ec = 133.42 * v * v * v - 255.86 * v * v + 857.39 * v;
    let ec25 = ec / (1.0 + 0.02 * (temperature_c - 25.0));
    ec25 * TDS_FACTOR
}

pub struct TdsSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    adc_channel: u32,
    temperature_c: f32,
}

impl TdsSensor {
    pub fn new(adc_channel: u32) -> Self {
        Self {
            adc_channel,
            temperature_c: DEFAULT_TEMPERATURE_C,
        }
    }

    pub fn set_temperature(&mut self, celsius: f32) {
        self.temperature_c = celsius;
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        Ok(SIM_TDS_ADC.load(Ordering::Relaxed))
    }
}

impl SensorSource for TdsSensor {
    fn channel(&self) -> Channel {
        Channel::Tds
    }

    fn sample(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_adc()?;
        Ok(tds_from_adc(raw, self.temperature_c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_volts_is_zero_ppm() {
        assert_eq!(tds_from_adc(0, 25.0), 0.0);
    }

    #[test]
    fn one_volt_at_reference_temperature() {
        // 1241 counts ≈ 1.0 V → ec ≈ 734.9 → ≈ 367 ppm.
        let ppm = tds_from_adc(1241, 25.0);
        assert!((ppm - 367.3).abs() < 1.0, "got {ppm}");
    }

    #[test]
    fn warmer_water_reads_lower() {
        assert!(tds_from_adc(1241, 30.0) < tds_from_adc(1241, 25.0));
    }

    #[test]
    fn sample_reads_simulated_adc() {
        sim_set_tds_adc(1241);
        let mut sensor = TdsSensor::new(crate::pins::TDS_ADC1_CHANNEL);
        assert_eq!(sensor.channel(), Channel::Tds);
        let ppm = sensor.sample().unwrap();
        assert!(ppm > 300.0 && ppm < 400.0);
    }
}
