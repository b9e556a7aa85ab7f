//! Monotonic time since boot.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()`, the ESP-IDF
//!   high-resolution timer (µs, monotonic).
//! - **host**: `std::time::Instant` measured from the first call.

use crate::app::ports::Clock;
use crate::types::Timestamp;

/// Microseconds since boot.  Also drives the ultrasonic echo timing.
#[cfg(target_os = "espidf")]
pub fn micros_since_boot() -> u64 {
    // SAFETY: esp_timer is started by the IDF before app_main.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    us.max(0) as u64
}

/// Microseconds since the first call in this process.
#[cfg(not(target_os = "espidf"))]
pub fn micros_since_boot() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static BOOT: OnceLock<Instant> = OnceLock::new();
    BOOT.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// [`Clock`] backed by [`micros_since_boot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(micros_since_boot() / 1_000)
    }
}
