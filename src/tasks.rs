//! The concrete periodic jobs: one per sensor, one control loop, one telemetry.
//!
//! Each job holds an `Arc` of the service and its own event sink, so jobs
//! never share mutable state with each other or with the HTTP handlers.

use std::sync::Arc;

use log::warn;

use crate::app::ports::{ActuatorSink, Clock, EventSink, SensorSource};
use crate::app::service::ReservoirService;
use crate::error::Error;
use crate::scheduler::PeriodicJob;
use crate::types::Channel;

// ── Sampling ──────────────────────────────────────────────────

/// Samples one [`SensorSource`] and records the value.
///
/// A failed sample is logged and the previous reading stays in place;
/// the next attempt happens on the next period, never sooner.
pub struct SamplingJob<S, A, C, E> {
    source: S,
    service: Arc<ReservoirService<A, C>>,
    sink: E,
    interval_ms: u64,
}

impl<S: SensorSource, A: ActuatorSink, C: Clock, E: EventSink> SamplingJob<S, A, C, E> {
    pub fn new(source: S, service: Arc<ReservoirService<A, C>>, sink: E) -> Self {
        let interval_ms = u64::from(service.config().sample_interval_ms(source.channel()));
        Self {
            source,
            service,
            sink,
            interval_ms,
        }
    }
}

impl<S: SensorSource, A: ActuatorSink, C: Clock, E: EventSink> PeriodicJob for SamplingJob<S, A, C, E> {
    fn label(&self) -> &'static str {
        match self.source.channel() {
            Channel::Reservoir => "sample-reservoir",
            Channel::Well => "sample-well",
            Channel::Tds => "sample-tds",
        }
    }

    fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn run(&mut self) {
        let channel = self.source.channel();
        match self.source.sample() {
            Ok(value) => {
                self.service.record(channel, value, &mut self.sink);
            }
            Err(e) => warn!("{} {}", channel, Error::from(e)),
        }
    }
}

// ── Control ───────────────────────────────────────────────────

pub struct ControlJob<A, C, E> {
    service: Arc<ReservoirService<A, C>>,
    sink: E,
}

impl<A: ActuatorSink, C: Clock, E: EventSink> ControlJob<A, C, E> {
    pub fn new(service: Arc<ReservoirService<A, C>>, sink: E) -> Self {
        Self { service, sink }
    }
}

impl<A: ActuatorSink, C: Clock, E: EventSink> PeriodicJob for ControlJob<A, C, E> {
    fn label(&self) -> &'static str {
        "control"
    }

    fn interval_ms(&self) -> u64 {
        u64::from(self.service.config().control_interval_ms)
    }

    fn run(&mut self) {
        self.service.control_tick(&mut self.sink);
    }
}

// ── Telemetry ─────────────────────────────────────────────────

pub struct TelemetryJob<A, C, E> {
    service: Arc<ReservoirService<A, C>>,
    sink: E,
}

impl<A: ActuatorSink, C: Clock, E: EventSink> TelemetryJob<A, C, E> {
    pub fn new(service: Arc<ReservoirService<A, C>>, sink: E) -> Self {
        Self { service, sink }
    }
}

impl<A: ActuatorSink, C: Clock, E: EventSink> PeriodicJob for TelemetryJob<A, C, E> {
    fn label(&self) -> &'static str {
        "telemetry"
    }

    fn interval_ms(&self) -> u64 {
        u64::from(self.service.config().telemetry_interval_secs) * 1_000
    }

    fn run(&mut self) {
        self.service.publish_telemetry(&mut self.sink);
    }
}
