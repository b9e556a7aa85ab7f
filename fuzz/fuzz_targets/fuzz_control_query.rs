//! Fuzz target: control-surface router
//!
//! Feeds arbitrary request URIs to `ControlSurface::handle_uri` and checks:
//! - No panics on any input
//! - Status is always one of 200 / 400 / 404 / 409
//! - Only a 200 from `/control` may change a pump flag
//!
//! cargo fuzz run fuzz_control_query

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use reservoir::app::events::AppEvent;
use reservoir::app::ports::{ActuatorSink, Clock, EventSink};
use reservoir::app::service::ReservoirService;
use reservoir::config::SystemConfig;
use reservoir::error::ActuatorError;
use reservoir::surface::ControlSurface;
use reservoir::types::{PumpId, Timestamp};

struct NullRelays;

impl ActuatorSink for NullRelays {
    fn set(&mut self, _: PumpId, _: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(10_000)
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(service) = ReservoirService::new(SystemConfig::default(), NullRelays, FixedClock) else {
        return;
    };
    let service = Arc::new(service);
    service.start(&mut Discard);
    let surface = ControlSurface::new(service);

    let before = surface.get_status();
    let reply = surface.handle_uri(uri, &mut Discard);
    assert!(matches!(reply.status, 200 | 400 | 404 | 409), "status {}", reply.status);

    let after = surface.get_status();
    let changed = PumpId::ALL.iter().any(|&p| before.pump(p) != after.pump(p));
    if changed {
        assert_eq!(reply.status, 200);
        assert!(uri.starts_with("/control"));
    }
});
