//! Pump controller: hysteresis decisions gated by a per-pump debounce clock.
//!
//! One evaluation runs per control tick (and once per manual toggle):
//!
//! ```text
//!  snapshot ─▶ Inflow  (reservoir band) ─▶ gate ─▶ relay + state
//!           ─▶ Outflow (= !Inflow)      ─▶ gate ─▶ relay + state
//!           ─▶ Auxiliary (well band, opt-in) ─▶ gate ─▶ relay + state
//! ```
//!
//! The controller never logs.  It is always called with its own guard held
//! (see [`ReservoirService`](crate::app::service::ReservoirService)); every
//! decision is returned in a [`TickReport`] for the caller to emit.

use heapless::Vec;

use crate::app::ports::ActuatorSink;
use crate::config::{AuxiliaryMode, SystemConfig};
use crate::error::ActuatorError;
use crate::state::{SharedState, SystemSnapshot};
use crate::types::{Channel, PumpId, PumpState, Timestamp};

use super::hysteresis::HysteresisBand;

// ───────────────────────────────────────────────────────────────
// Reports
// ───────────────────────────────────────────────────────────────

/// Why a pump switched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// Auxiliary seed at controller start.
    Startup,
    /// Level crossed a hysteresis threshold.
    Hysteresis,
    /// Outflow following Inflow.
    Coupled,
    /// Operator toggle from the control surface.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub pump: PumpId,
    pub is_on: bool,
    pub at: Timestamp,
    pub cause: TransitionCause,
}

/// A mismatch the debounce gate held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    pub pump: PumpId,
    pub desired: bool,
    pub retry_in_ms: u64,
}

/// Everything one evaluation decided.  At most one entry per pump in each list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub transitions: Vec<Transition, { PumpId::COUNT }>,
    pub deferred: Vec<Deferred, { PumpId::COUNT }>,
    /// Channels whose reading was absent or too old; their pumps held.
    pub stale: Vec<Channel, { Channel::COUNT }>,
    pub actuator_faults: Vec<(PumpId, ActuatorError), { PumpId::COUNT }>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.transitions.is_empty() && self.deferred.is_empty() && self.actuator_faults.is_empty()
    }

    pub fn transition_for(&self, pump: PumpId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.pump == pump)
    }
}

/// Result of a manual toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The pump switched and is now `is_on`.
    Switched { is_on: bool },
    /// The gate is closed; the request was dropped, not queued.
    Debounced { retry_in_ms: u64 },
    /// The pump refuses manual control in its current mode.
    Locked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleAck {
    pub pump: PumpId,
    pub outcome: ToggleOutcome,
    /// All transitions of the evaluation, including coupled ones.
    pub report: TickReport,
}

// ───────────────────────────────────────────────────────────────
// Debounce gate
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Closed { retry_in_ms: u64 },
}

/// Open only when strictly more than `min_interval_ms` has elapsed since the
/// pump's last change, or it has never changed.  A clock reading earlier
/// than the last change counts as zero elapsed.
pub fn gate(pump: PumpState, now: Timestamp, min_interval_ms: u64) -> Gate {
    let Some(last) = pump.last_change_at else {
        return Gate::Open;
    };
    let elapsed = now.saturating_since(last);
    if elapsed > min_interval_ms {
        Gate::Open
    } else {
        Gate::Closed {
            retry_in_ms: (min_interval_ms - elapsed).saturating_add(1),
        }
    }
}

enum Drive {
    Unchanged,
    Switched,
    Deferred(u64),
}

// ───────────────────────────────────────────────────────────────
// PumpController
// ───────────────────────────────────────────────────────────────

pub struct PumpController<A> {
    actuator: A,
    inflow_band: HysteresisBand,
    auxiliary: AuxiliaryMode,
    min_change_interval_ms: u64,
    reading_max_age_ms: u64,
    started: bool,
}

impl<A: ActuatorSink> PumpController<A> {
    pub fn new(config: &SystemConfig, actuator: A) -> Self {
        Self {
            actuator,
            inflow_band: config.inflow_band,
            auxiliary: config.auxiliary,
            min_change_interval_ms: config.min_change_interval_ms,
            reading_max_age_ms: config.reading_max_age_ms,
            started: false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Seed the Auxiliary pump on and drive every relay to its flag.
    ///
    /// Idempotent: a second call returns an empty report.
    pub fn start(&mut self, state: &SharedState, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();
        if self.started {
            return report;
        }
        self.started = true;

        let aux = state.snapshot(now).pump(PumpId::Auxiliary);
        if !aux.is_on && state.apply_pump_decision(PumpId::Auxiliary, true, now) {
            let _ = report.transitions.push(Transition {
                pump: PumpId::Auxiliary,
                is_on: true,
                at: now,
                cause: TransitionCause::Startup,
            });
        }

        let snap = state.snapshot(now);
        for pump in PumpId::ALL {
            if let Err(e) = self.actuator.set(pump, snap.pump(pump).is_on) {
                let _ = report.actuator_faults.push((pump, e));
            }
        }
        report
    }

    /// One control-loop evaluation.
    pub fn tick(&mut self, state: &SharedState, now: Timestamp) -> TickReport {
        self.evaluate(state, now, None)
    }

    /// Flip the desired state of `pump` for one evaluation.
    ///
    /// The debounce gate applies exactly as for automatic decisions.
    /// Coupled consequences (Outflow following a toggled Inflow) land in
    /// the same evaluation and are returned in the ack's report.
    pub fn request_toggle(&mut self, state: &SharedState, pump: PumpId, now: Timestamp) -> ToggleAck {
        if pump == PumpId::Auxiliary && self.auxiliary == AuxiliaryMode::AlwaysOn {
            return ToggleAck {
                pump,
                outcome: ToggleOutcome::Locked,
                report: TickReport::default(),
            };
        }

        let mut manual = None;
        let report = self.evaluate_with(state, now, Some(pump), &mut manual);
        let outcome = match manual {
            Some(Drive::Deferred(retry_in_ms)) => ToggleOutcome::Debounced { retry_in_ms },
            _ => ToggleOutcome::Switched {
                is_on: state.snapshot(now).pump(pump).is_on,
            },
        };
        ToggleAck {
            pump,
            outcome,
            report,
        }
    }

    fn evaluate(&mut self, state: &SharedState, now: Timestamp, manual: Option<PumpId>) -> TickReport {
        let mut ignored = None;
        self.evaluate_with(state, now, manual, &mut ignored)
    }

    /// The transition function.  `manual_result` receives the gate outcome
    /// for the manually toggled pump, if any.
    fn evaluate_with(
        &mut self,
        state: &SharedState,
        now: Timestamp,
        manual: Option<PumpId>,
        manual_result: &mut Option<Drive>,
    ) -> TickReport {
        let mut report = TickReport::default();
        let snap = state.snapshot(now);

        // ── Inflow ───────────────────────────────────────────
        let inflow = snap.pump(PumpId::Inflow);
        let (desired, cause) = if manual == Some(PumpId::Inflow) {
            (!inflow.is_on, TransitionCause::Manual)
        } else {
            let desired = self.level_decision(&snap, Channel::Reservoir, self.inflow_band, inflow, &mut report);
            (desired, TransitionCause::Hysteresis)
        };
        let result = self.drive(state, PumpId::Inflow, inflow, desired, now, cause, &mut report);
        let inflow_on = match result {
            Drive::Switched => desired,
            _ => inflow.is_on,
        };
        if manual == Some(PumpId::Inflow) {
            *manual_result = Some(result);
        }

        // ── Outflow ──────────────────────────────────────────
        let outflow = snap.pump(PumpId::Outflow);
        let (desired, cause) = if manual == Some(PumpId::Outflow) {
            (!outflow.is_on, TransitionCause::Manual)
        } else if snap.reading(Channel::Reservoir).is_present() {
            (!inflow_on, TransitionCause::Coupled)
        } else {
            // No reservoir level yet: draining blind could empty the tank.
            (outflow.is_on, TransitionCause::Coupled)
        };
        let result = self.drive(state, PumpId::Outflow, outflow, desired, now, cause, &mut report);
        if manual == Some(PumpId::Outflow) {
            *manual_result = Some(result);
        }

        // ── Auxiliary ────────────────────────────────────────
        if let AuxiliaryMode::LevelControlled(band) = self.auxiliary {
            let aux = snap.pump(PumpId::Auxiliary);
            let (desired, cause) = if manual == Some(PumpId::Auxiliary) {
                (!aux.is_on, TransitionCause::Manual)
            } else {
                let desired = self.level_decision(&snap, Channel::Well, band, aux, &mut report);
                (desired, TransitionCause::Hysteresis)
            };
            let result = self.drive(state, PumpId::Auxiliary, aux, desired, now, cause, &mut report);
            if manual == Some(PumpId::Auxiliary) {
                *manual_result = Some(result);
            }
        }

        report
    }

    /// Hysteresis on a level channel; absent or stale readings hold.
    fn level_decision(
        &self,
        snap: &SystemSnapshot,
        channel: Channel,
        band: HysteresisBand,
        pump: PumpState,
        report: &mut TickReport,
    ) -> bool {
        match snap.reading(channel).fresh_value(snap.taken_at, self.reading_max_age_ms) {
            Some(level) => band.desired(level, pump.is_on),
            None => {
                let _ = report.stale.push(channel);
                pump.is_on
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn drive(
        &mut self,
        state: &SharedState,
        pump: PumpId,
        current: PumpState,
        desired: bool,
        now: Timestamp,
        cause: TransitionCause,
        report: &mut TickReport,
    ) -> Drive {
        if desired == current.is_on {
            return Drive::Unchanged;
        }
        let retry_in_ms = match gate(current, now, self.min_change_interval_ms) {
            Gate::Open if state.apply_pump_decision(pump, desired, now) => {
                if let Err(e) = self.actuator.set(pump, desired) {
                    let _ = report.actuator_faults.push((pump, e));
                }
                let _ = report.transitions.push(Transition {
                    pump,
                    is_on: desired,
                    at: now,
                    cause,
                });
                return Drive::Switched;
            }
            Gate::Open => self.min_change_interval_ms.saturating_add(1),
            Gate::Closed { retry_in_ms } => retry_in_ms,
        };
        let _ = report.deferred.push(Deferred {
            pump,
            desired,
            retry_in_ms,
        });
        Drive::Deferred(retry_in_ms)
    }
}
