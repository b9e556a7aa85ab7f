//! Application service: the hexagonal core.
//!
//! [`ReservoirService`] owns the shared state, the pump controller, the
//! clock and the validated configuration.  Periodic jobs and the control
//! surface reach the core only through this type; it is `Sync` whenever
//! the actuator is `Send` and the clock is `Sync`.
//!
//! ```text
//!  SensorSource ──record──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                           │      ReservoirService      │
//!  ActuatorSink ◀───────────│  PumpController · State    │ ◀── ControlSurface
//!                           └────────────────────────────┘
//! ```
//!
//! Lock order is controller guard, then state guard.  Events are emitted
//! only after both guards are released.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info};

use crate::config::SystemConfig;
use crate::control::controller::{PumpController, TickReport, ToggleAck, ToggleOutcome};
use crate::error::{ConfigError, ControlError};
use crate::state::{SharedState, SystemSnapshot};
use crate::surface::report::StatusReport;
use crate::types::{Channel, PumpId, Timestamp};

use super::events::AppEvent;
use super::ports::{ActuatorSink, Clock, EventSink};

// ───────────────────────────────────────────────────────────────
// ReservoirService
// ───────────────────────────────────────────────────────────────

pub struct ReservoirService<A, C> {
    config: SystemConfig,
    state: SharedState,
    controller: Mutex<CriticalSectionRawMutex, RefCell<PumpController<A>>>,
    clock: C,
}

impl<A: ActuatorSink, C: Clock> ReservoirService<A, C> {
    /// Validate `config` and build the service.
    ///
    /// Does **not** start the controller: call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, actuator: A, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = PumpController::new(&config, actuator);
        Ok(Self {
            config,
            state: SharedState::new(),
            controller: Mutex::new(RefCell::new(controller)),
            clock,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Seed the Auxiliary pump and drive every relay to its flag.  Idempotent.
    ///
    /// The first control tick or toggle starts the controller if this was
    /// never called.
    pub fn start(&self, sink: &mut impl EventSink) {
        let now = self.clock.now();
        let seed = self
            .controller
            .lock(|cell| self.seed_if_needed(&mut cell.borrow_mut(), now));
        if let Some(seed) = seed {
            announce_start(now, &seed, sink);
        }
    }

    /// Start `ctl` unless already started.  Caller holds the controller guard.
    fn seed_if_needed(&self, ctl: &mut PumpController<A>, now: Timestamp) -> Option<TickReport> {
        (!ctl.is_started()).then(|| ctl.start(&self.state, now))
    }

    // ── Sensor ingestion ──────────────────────────────────────

    /// Store a sample for `channel`, stamped with the current time.
    ///
    /// NaN is refused; anything else is clamped into the channel's
    /// configured range.  Returns whether the sample was stored.
    pub fn record(&self, channel: Channel, value: f32, sink: &mut impl EventSink) -> bool {
        if value.is_nan() {
            sink.emit(&AppEvent::ReadingRejected { channel, value });
            return false;
        }
        let (lo, hi) = self.config.channel_range(channel);
        let clamped = value.clamp(lo, hi);
        let now = self.clock.now();
        self.state.update_reading(channel, clamped, now);
        debug!("{} = {:.2}{} at {}", channel, clamped, channel.unit(), now);
        true
    }

    // ── Control ───────────────────────────────────────────────

    /// Run one evaluation of the transition function.
    pub fn control_tick(&self, sink: &mut impl EventSink) -> TickReport {
        let now = self.clock.now();
        let (seed, report) = self.controller.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let seed = self.seed_if_needed(&mut ctl, now);
            (seed, ctl.tick(&self.state, now))
        });
        if let Some(seed) = seed {
            announce_start(now, &seed, sink);
        }
        emit_report(&report, sink);
        report
    }

    /// Manual toggle by wire identifier (1, 2 or 3).
    ///
    /// Unknown identifiers are rejected without touching any state.
    pub fn request_toggle(&self, wire_id: u8, sink: &mut impl EventSink) -> Result<ToggleAck, ControlError> {
        let pump = match PumpId::from_wire(wire_id) {
            Ok(pump) => pump,
            Err(error) => {
                sink.emit(&AppEvent::ToggleRejected {
                    wire_id: Some(wire_id),
                    error,
                });
                return Err(error);
            }
        };

        let now = self.clock.now();
        let (seed, ack) = self.controller.lock(|cell| {
            let mut ctl = cell.borrow_mut();
            let seed = self.seed_if_needed(&mut ctl, now);
            (seed, ctl.request_toggle(&self.state, pump, now))
        });

        if let Some(seed) = seed {
            announce_start(now, &seed, sink);
        }
        emit_report(&ack.report, sink);
        match ack.outcome {
            ToggleOutcome::Switched { .. } => {}
            ToggleOutcome::Debounced { retry_in_ms } => {
                sink.emit(&AppEvent::ToggleDeferred { pump, retry_in_ms });
            }
            ToggleOutcome::Locked => sink.emit(&AppEvent::ToggleLocked(pump)),
        }
        Ok(ack)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Consistent copy of the shared state; no stamp in it postdates `taken_at`.
    pub fn snapshot(&self) -> SystemSnapshot {
        self.state.snapshot_with(|| self.clock.now())
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport::from_snapshot(&self.snapshot(), &self.config)
    }

    /// Emit a telemetry event carrying the current status.
    pub fn publish_telemetry(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Telemetry(self.status_report()));
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

fn announce_start(now: Timestamp, seed: &TickReport, sink: &mut impl EventSink) {
    info!("Controller started at {}", now);
    sink.emit(&AppEvent::Started(now));
    emit_report(seed, sink);
}

/// Translate a report into events, in decision order.
fn emit_report(report: &TickReport, sink: &mut impl EventSink) {
    for t in &report.transitions {
        sink.emit(&AppEvent::PumpSwitched(*t));
    }
    for d in &report.deferred {
        sink.emit(&AppEvent::SwitchDeferred(*d));
    }
    for channel in &report.stale {
        sink.emit(&AppEvent::ReadingStale(*channel));
    }
    for (pump, error) in &report.actuator_faults {
        sink.emit(&AppEvent::ActuatorFault {
            pump: *pump,
            error: *error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActuatorError;
    use core::sync::atomic::{AtomicU64, Ordering};

    struct NullRelays;

    impl ActuatorSink for NullRelays {
        fn set(&mut self, _pump: PumpId, _on: bool) -> Result<(), ActuatorError> {
            Ok(())
        }
    }

    struct FixedClock(AtomicU64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::from_millis(self.0.load(Ordering::Relaxed))
        }
    }

    #[derive(Default)]
    struct Events(Vec<AppEvent>);

    impl EventSink for Events {
        fn emit(&mut self, event: &AppEvent) {
            self.0.push(event.clone());
        }
    }

    fn service() -> ReservoirService<NullRelays, FixedClock> {
        ReservoirService::new(SystemConfig::default(), NullRelays, FixedClock(AtomicU64::new(0))).unwrap()
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = SystemConfig {
            min_change_interval_ms: 2_000,
            control_interval_ms: 0,
            ..SystemConfig::default()
        };
        let result = ReservoirService::new(config, NullRelays, FixedClock(AtomicU64::new(0)));
        assert!(result.is_err());
    }

    #[test]
    fn start_emits_once() {
        let svc = service();
        let mut events = Events::default();
        svc.start(&mut events);
        svc.start(&mut events);
        let starts = events.0.iter().filter(|e| matches!(e, AppEvent::Started(_))).count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn nan_is_rejected_and_infinities_are_clamped() {
        let svc = service();
        let mut events = Events::default();

        assert!(!svc.record(Channel::Reservoir, f32::NAN, &mut events));
        assert!(matches!(
            events.0.last(),
            Some(AppEvent::ReadingRejected {
                channel: Channel::Reservoir,
                ..
            })
        ));
        assert!(!svc.snapshot().reading(Channel::Reservoir).is_present());

        assert!(svc.record(Channel::Reservoir, f32::INFINITY, &mut events));
        assert_eq!(svc.snapshot().reading(Channel::Reservoir).value, 18.0);

        assert!(svc.record(Channel::Well, -4.0, &mut events));
        assert_eq!(svc.snapshot().reading(Channel::Well).value, 0.0);
    }

    #[test]
    fn unknown_pump_leaves_state_untouched() {
        let svc = service();
        let mut events = Events::default();
        svc.start(&mut events);
        let before = svc.snapshot();

        assert_eq!(svc.request_toggle(7, &mut events).unwrap_err(), ControlError::UnknownPump);
        assert_eq!(svc.snapshot(), before);
        assert!(matches!(
            events.0.last(),
            Some(AppEvent::ToggleRejected {
                wire_id: Some(7),
                error: ControlError::UnknownPump
            })
        ));
    }

    #[test]
    fn first_tick_starts_an_unstarted_controller() {
        let svc = service();
        let mut events = Events::default();

        svc.control_tick(&mut events);
        assert!(matches!(events.0.first(), Some(AppEvent::Started(_))));
        assert!(svc.snapshot().pump(PumpId::Auxiliary).is_on);

        svc.start(&mut events);
        svc.control_tick(&mut events);
        let starts = events.0.iter().filter(|e| matches!(e, AppEvent::Started(_))).count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn first_toggle_starts_an_unstarted_controller() {
        let svc = service();
        let mut events = Events::default();

        let ack = svc.request_toggle(3, &mut events).unwrap();
        assert_eq!(ack.outcome, ToggleOutcome::Locked);
        assert!(svc.snapshot().pump(PumpId::Auxiliary).is_on);
        assert!(matches!(events.0.first(), Some(AppEvent::Started(_))));
    }

    #[test]
    fn telemetry_carries_status() {
        let svc = service();
        let mut events = Events::default();
        svc.publish_telemetry(&mut events);
        assert!(matches!(events.0.as_slice(), [AppEvent::Telemetry(_)]));
    }
}
