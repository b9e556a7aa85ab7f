//! GPIO / peripheral pin assignments for the reservoir controller board.
//!
//! Board wiring reference.  `main` takes the matching `gpioN` peripherals;
//! the TDS channel and ADC scaling are read from here directly.

// ---------------------------------------------------------------------------
// Ultrasonic level gauges (HC-SR04 style, 5 V tolerant echo divider)
// ---------------------------------------------------------------------------

/// Reservoir gauge trigger output.
pub const RESERVOIR_TRIG_GPIO: i32 = 15;
/// Reservoir gauge echo input.
pub const RESERVOIR_ECHO_GPIO: i32 = 4;

/// Well gauge trigger output.
pub const WELL_TRIG_GPIO: i32 = 14;
/// Well gauge echo input.
pub const WELL_ECHO_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Relay bank (active-low: LOW = pump running)
// ---------------------------------------------------------------------------

pub const INFLOW_RELAY_GPIO: i32 = 25;
pub const OUTFLOW_RELAY_GPIO: i32 = 27;
pub const AUXILIARY_RELAY_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// TDS sensor (analog)
// ---------------------------------------------------------------------------

/// TDS sensor output.  ADC1 channel 7 (GPIO 35 on ESP32).
pub const TDS_ADC_GPIO: i32 = 35;
/// ADC1 channel number matching [`TDS_ADC_GPIO`].
pub const TDS_ADC1_CHANNEL: u32 = 7;
/// Full-scale count of the 12-bit ADC.
pub const ADC_RANGE: f32 = 4096.0;
/// ADC reference voltage (V).
pub const ADC_VREF: f32 = 3.3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pin_is_wired_twice() {
        let mut pins = [
            RESERVOIR_TRIG_GPIO,
            RESERVOIR_ECHO_GPIO,
            WELL_TRIG_GPIO,
            WELL_ECHO_GPIO,
            INFLOW_RELAY_GPIO,
            OUTFLOW_RELAY_GPIO,
            AUXILIARY_RELAY_GPIO,
            TDS_ADC_GPIO,
        ];
        pins.sort_unstable();
        assert!(pins.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn tds_sits_on_an_input_only_adc1_pin() {
        // GPIO 34-39 are input-only and belong to ADC1.
        assert!((34..=39).contains(&TDS_ADC_GPIO));
    }
}
