//! Mock adapters for integration tests.
//!
//! Records every relay command and event so tests can assert on the full
//! history without touching real GPIO.  Handles are cheap clones over
//! shared storage: one copy goes into the service, the test keeps the other.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reservoir::app::events::AppEvent;
use reservoir::app::ports::{ActuatorSink, Clock, EventSink};
use reservoir::app::service::ReservoirService;
use reservoir::config::SystemConfig;
use reservoir::control::controller::Transition;
use reservoir::error::ActuatorError;
use reservoir::types::{Channel, PumpId, Timestamp};

// ── Relays ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCall {
    pub pump: PumpId,
    pub on: bool,
}

#[derive(Clone, Default)]
pub struct RecordingRelays {
    calls: Arc<Mutex<Vec<RelayCall>>>,
    broken: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl RecordingRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last commanded level for `pump`, if it was ever driven.
    pub fn level(&self, pump: PumpId) -> Option<bool> {
        self.calls.lock().unwrap().iter().rev().find(|c| c.pump == pump).map(|c| c.on)
    }

    /// Make every following `set` fail.
    pub fn break_wiring(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl ActuatorSink for RecordingRelays {
    fn set(&mut self, pump: PumpId, on: bool) -> Result<(), ActuatorError> {
        self.calls.lock().unwrap().push(RelayCall { pump, on });
        if self.broken.load(Ordering::SeqCst) {
            Err(ActuatorError::GpioWriteFailed)
        } else {
            Ok(())
        }
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.0.load(Ordering::SeqCst))
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<AppEvent>>>);

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn switches(&self) -> Vec<Transition> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                AppEvent::PumpSwitched(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Service = ReservoirService<RecordingRelays, ManualClock>;

pub struct Rig {
    pub service: Arc<Service>,
    pub relays: RecordingRelays,
    pub clock: ManualClock,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig) -> Self {
        let relays = RecordingRelays::new();
        let clock = ManualClock::new();
        let service = ReservoirService::new(config, relays.clone(), clock.clone()).expect("valid config");
        Self {
            service: Arc::new(service),
            relays,
            clock,
            sink: RecordingSink::new(),
        }
    }

    /// A rig already past `start`.
    pub fn started(config: SystemConfig) -> Self {
        let mut rig = Self::new(config);
        rig.service.start(&mut rig.sink);
        rig
    }

    pub fn at(&self, ms: u64) -> &Self {
        self.clock.set(ms);
        self
    }

    pub fn tick(&mut self) {
        self.service.control_tick(&mut self.sink);
    }

    pub fn reservoir(&mut self, cm: f32) {
        self.service.record(Channel::Reservoir, cm, &mut self.sink);
    }

    pub fn is_on(&self, pump: PumpId) -> bool {
        self.service.snapshot().pump(pump).is_on
    }
}
