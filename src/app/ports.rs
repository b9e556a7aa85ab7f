//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ReservoirService (domain)
//! ```
//!
//! Driven adapters (gauges, relays, clocks, event sinks) implement these
//! traits.  [`ReservoirService`](super::service::ReservoirService) and the
//! [`PumpController`](crate::control::controller::PumpController) consume
//! them via generics, so the domain core never touches hardware directly.

use crate::error::{ActuatorError, SensorError};
use crate::types::{Channel, PumpId, Timestamp};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One physical quantity, sampled on demand by its periodic job.
pub trait SensorSource {
    /// The channel this source feeds.
    fn channel(&self) -> Channel;

    /// Take one sample in the channel's unit (cm or ppm).
    fn sample(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// On/off command per pump.
///
/// Called by the controller while its guard is held: implementations must
/// not block for long and must not log.  Failures are returned so the
/// service can report them after the guard is released.
pub trait ActuatorSink {
    fn set(&mut self, pump: PumpId, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
