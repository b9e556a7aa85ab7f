//! System configuration parameters.
//!
//! All tunable parameters for the reservoir controller.  Defaults mirror the
//! constants the board shipped with; nothing is persisted across restarts.

use serde::{Deserialize, Serialize};

use crate::control::hysteresis::HysteresisBand;
use crate::error::ConfigError;
use crate::types::Channel;

/// How the Auxiliary (well) pump is driven after startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AuxiliaryMode {
    /// Forced on at start and never switched again.  Manual toggles are refused.
    AlwaysOn,
    /// Hysteresis on the Well level, debounced like the other pumps.
    LevelControlled(HysteresisBand),
}

/// Core system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control ---
    /// Reservoir band driving the Inflow pump.
    pub inflow_band: HysteresisBand,
    pub auxiliary: AuxiliaryMode,
    /// A pump may switch again only once strictly more than this has elapsed.
    pub min_change_interval_ms: u64,
    /// Readings older than this are stale and hold pump state.
    pub reading_max_age_ms: u64,

    // --- Timing ---
    pub control_interval_ms: u32,
    /// Ultrasonic sampling period, per gauge.
    pub level_sample_interval_ms: u32,
    pub tds_sample_interval_ms: u32,
    pub telemetry_interval_secs: u32,

    // --- Plant geometry ---
    /// Distance from the reservoir gauge to the tank floor (cm).
    pub reservoir_height_cm: f32,
    /// Distance from the well gauge to the well floor (cm).
    pub well_height_cm: f32,
    /// Upper clamp for TDS readings (ppm).
    pub tds_max_ppm: f32,

    // --- Reporting ---
    /// Flow figure reported whenever any pump runs (mL/s).  Not measured.
    pub nominal_flow_ml_per_s: f32,
    pub http_port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Control
            inflow_band: HysteresisBand {
                on_below: 2.0,
                off_at: 4.0,
            },
            auxiliary: AuxiliaryMode::AlwaysOn,
            min_change_interval_ms: 2_000,
            reading_max_age_ms: 5_000,

            // Timing
            control_interval_ms: 200,      // 5 Hz
            level_sample_interval_ms: 500, // 2 Hz
            tds_sample_interval_ms: 2_000,
            telemetry_interval_secs: 10,

            // Plant
            reservoir_height_cm: 18.0,
            well_height_cm: 6.0,
            tds_max_ppm: 1_000.0,

            // Reporting
            nominal_flow_ml_per_s: 26.785,
            http_port: 80,
        }
    }
}

impl SystemConfig {
    /// Reject configurations the controller cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.inflow_band
            .validate()
            .map_err(|_| ConfigError::ValidationFailed("inflow_band: on_below must be below off_at"))?;
        if let AuxiliaryMode::LevelControlled(band) = self.auxiliary {
            band.validate().map_err(|_| {
                ConfigError::ValidationFailed("auxiliary band: on_below must be below off_at")
            })?;
        }
        if self.control_interval_ms == 0
            || self.level_sample_interval_ms == 0
            || self.tds_sample_interval_ms == 0
            || self.telemetry_interval_secs == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if self.reading_max_age_ms < u64::from(self.level_sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "reading_max_age_ms shorter than the level sampling period",
            ));
        }
        if !(self.reservoir_height_cm.is_finite() && self.reservoir_height_cm > 0.0) {
            return Err(ConfigError::ValidationFailed("reservoir_height_cm must be positive"));
        }
        if !(self.well_height_cm.is_finite() && self.well_height_cm > 0.0) {
            return Err(ConfigError::ValidationFailed("well_height_cm must be positive"));
        }
        if !(self.tds_max_ppm.is_finite() && self.tds_max_ppm > 0.0) {
            return Err(ConfigError::ValidationFailed("tds_max_ppm must be positive"));
        }
        if !(self.nominal_flow_ml_per_s.is_finite() && self.nominal_flow_ml_per_s >= 0.0) {
            return Err(ConfigError::ValidationFailed("nominal_flow_ml_per_s must be non-negative"));
        }
        Ok(())
    }

    /// Plausible value range for a channel; readings are clamped into it.
    pub fn channel_range(&self, channel: Channel) -> (f32, f32) {
        match channel {
            Channel::Reservoir => (0.0, self.reservoir_height_cm),
            Channel::Well => (0.0, self.well_height_cm),
            Channel::Tds => (0.0, self.tds_max_ppm),
        }
    }

    /// Sampling period for a channel's producer job.
    pub fn sample_interval_ms(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Reservoir | Channel::Well => self.level_sample_interval_ms,
            Channel::Tds => self.tds_sample_interval_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = SystemConfig::default();
        assert_eq!(c.validate(), Ok(()));
        assert!(c.inflow_band.on_below < c.inflow_band.off_at);
        assert_eq!(c.auxiliary, AuxiliaryMode::AlwaysOn);
        assert_eq!(c.min_change_interval_ms, 2_000);
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.control_interval_ms < c.level_sample_interval_ms,
            "control loop should run faster than level sampling"
        );
        assert!(
            u64::from(c.level_sample_interval_ms) < c.reading_max_age_ms,
            "a healthy gauge must never look stale"
        );
    }

    #[test]
    fn inverted_band_is_rejected() {
        let c = SystemConfig {
            inflow_band: HysteresisBand {
                on_below: 4.0,
                off_at: 4.0,
            },
            ..SystemConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn inverted_auxiliary_band_is_rejected() {
        let c = SystemConfig {
            auxiliary: AuxiliaryMode::LevelControlled(HysteresisBand {
                on_below: 5.0,
                off_at: 1.0,
            }),
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_interval_and_bad_geometry_are_rejected() {
        let c = SystemConfig {
            control_interval_ms: 0,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());

        let c = SystemConfig {
            reservoir_height_cm: f32::NAN,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());

        let c = SystemConfig {
            reading_max_age_ms: 100,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn channel_ranges_follow_geometry() {
        let c = SystemConfig::default();
        assert_eq!(c.channel_range(Channel::Reservoir), (0.0, 18.0));
        assert_eq!(c.channel_range(Channel::Well), (0.0, 6.0));
        assert_eq!(c.channel_range(Channel::Tds), (0.0, 1_000.0));
        assert_eq!(c.sample_interval_ms(Channel::Tds), 2_000);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig {
            auxiliary: AuxiliaryMode::LevelControlled(HysteresisBand {
                on_below: 1.5,
                off_at: 3.0,
            }),
            ..SystemConfig::default()
        };
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }
}
