//! Pump control: hysteresis bands and the debounced transition function.

pub mod controller;
pub mod hysteresis;

pub use controller::{PumpController, TickReport, ToggleAck, ToggleOutcome, Transition, TransitionCause};
pub use hysteresis::HysteresisBand;
