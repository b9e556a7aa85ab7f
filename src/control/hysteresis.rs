//! Two-threshold hysteresis band.
//!
//! ```text
//!  level:   0 ──────── on_below ════ dead band ════ off_at ──────── max
//!  pump:        ON                    (hold)                 OFF
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Switch on below `on_below`, off at or above `off_at`, hold in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisBand {
    pub on_below: f32,
    pub off_at: f32,
}

impl HysteresisBand {
    /// Both thresholds finite and strictly ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.on_below.is_finite() && self.off_at.is_finite() && self.on_below < self.off_at {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed("hysteresis band inverted or non-finite"))
        }
    }

    /// Desired pump state for `level` given the pump's `current` state.
    ///
    /// NaN compares false against both thresholds and therefore holds.
    pub fn desired(&self, level: f32, current: bool) -> bool {
        if level < self.on_below {
            true
        } else if level >= self.off_at {
            false
        } else {
            current
        }
    }

    pub fn in_dead_band(&self, level: f32) -> bool {
        level >= self.on_below && level < self.off_at
    }
}
