//! Application core: pure domain logic, zero I/O.
//!
//! Reading bookkeeping, the pump controller and the manual override path.
//! All interaction with hardware happens through the **port traits** in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
