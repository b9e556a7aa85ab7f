//! Outbound application events.
//!
//! The [`ReservoirService`](super::service::ReservoirService) emits these
//! through the [`EventSink`](super::ports::EventSink) port once every guard
//! has been released.  Adapters decide what to do with them.

use crate::control::controller::{Deferred, Transition};
use crate::error::{ActuatorError, ControlError};
use crate::surface::report::StatusReport;
use crate::types::{Channel, PumpId, Timestamp};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller started; the Auxiliary pump is seeded on.
    Started(Timestamp),

    /// A pump changed state.
    PumpSwitched(Transition),

    /// A desired change was held back by the debounce gate.
    SwitchDeferred(Deferred),

    /// A level reading was absent or too old; its pump held state.
    ReadingStale(Channel),

    /// A sample was refused before reaching the shared state.
    ReadingRejected { channel: Channel, value: f32 },

    /// A relay could not be driven.  The pump flag still records the decision.
    ActuatorFault { pump: PumpId, error: ActuatorError },

    /// A manual toggle landed inside the debounce window and was dropped.
    ToggleDeferred { pump: PumpId, retry_in_ms: u64 },

    /// A manual toggle targeted a pump that refuses manual control.
    ToggleLocked(PumpId),

    /// A manual toggle named no known pump.  `wire_id` is `None` when the
    /// argument was not even a number.
    ToggleRejected { wire_id: Option<u8>, error: ControlError },

    /// Periodic status snapshot.
    Telemetry(StatusReport),
}
