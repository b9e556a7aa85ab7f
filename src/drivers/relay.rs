//! Three-channel pump relay bank.
//!
//! The relay modules are active-low: driving the input LOW energises the
//! coil and runs the pump, HIGH releases it.  Every relay is released at
//! construction so nothing runs before the controller starts.
//!
//! Generic over `embedded-hal` output pins: `PinDriver` on the board,
//! recording mocks in tests.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorSink;
use crate::error::ActuatorError;
use crate::types::PumpId;

pub struct RelayBank<P> {
    /// Indexed by [`PumpId::index`].
    pins: [P; PumpId::COUNT],
}

impl<P: OutputPin> RelayBank<P> {
    pub fn new(inflow: P, outflow: P, auxiliary: P) -> Self {
        let mut bank = Self {
            pins: [inflow, outflow, auxiliary],
        };
        for pump in PumpId::ALL {
            if let Err(e) = bank.drive(pump, false) {
                warn!("Relay {}: release at init failed: {}", pump, e);
            }
        }
        bank
    }

    fn drive(&mut self, pump: PumpId, on: bool) -> Result<(), ActuatorError> {
        let pin = &mut self.pins[pump.index()];
        let result = if on { pin.set_low() } else { pin.set_high() };
        result.map_err(|_| ActuatorError::GpioWriteFailed)
    }
}

impl<P: OutputPin> ActuatorSink for RelayBank<P> {
    fn set(&mut self, pump: PumpId, on: bool) -> Result<(), ActuatorError> {
        self.drive(pump, on)
    }
}
