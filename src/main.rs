//! Reservoir controller firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UltrasonicGauge ×2   TdsSensor     RelayBank    MonotonicClock │
//! │  (SensorSource)       (Sensor)     (Actuator)   (Clock)        │
//! │  EspHttpServer → ControlSurface    LogEventSink (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ReservoirService (pure logic)                 │    │
//! │  │  PumpController · hysteresis · debounce · SharedState  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (APP core): sample ×3 · control · telemetry         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{OutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use reservoir::adapters::log_sink::LogEventSink;
use reservoir::adapters::time::{MonotonicClock, micros_since_boot};
use reservoir::adapters::{http, wifi};
use reservoir::app::service::ReservoirService;
use reservoir::config::SystemConfig;
use reservoir::drivers::relay::RelayBank;
use reservoir::drivers::task_pin::{Core, TaskSpec, spawn_on_core};
use reservoir::drivers::hw_init;
use reservoir::pins;
use reservoir::scheduler::Scheduler;
use reservoir::sensors::{TdsSensor, UltrasonicGauge};
use reservoir::surface::ControlSurface;
use reservoir::tasks::{ControlJob, SamplingJob, TelemetryJob};
use reservoir::types::Channel;

const JOBS_TASK: TaskSpec = TaskSpec {
    core: Core::App,
    priority: 5,
    stack_kb: 16,
    name: "jobs\0",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Reservoir v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = match EspDefaultNvsPartition::take() {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("NVS partition unavailable ({}), WiFi runs without stored RF calibration", e);
            None
        }
    };

    // ── 2. Relays: released before anything else runs ─────────
    let relays = RelayBank::new(
        PinDriver::output(peripherals.pins.gpio25.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio27.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio26.downgrade_output())?,
    );

    // ── 3. Sensors ────────────────────────────────────────────
    let reservoir_gauge = UltrasonicGauge::new(
        Channel::Reservoir,
        PinDriver::output(peripherals.pins.gpio15)?,
        PinDriver::input(peripherals.pins.gpio4)?,
        Ets,
        micros_since_boot,
        config.reservoir_height_cm,
    );
    let well_gauge = UltrasonicGauge::new(
        Channel::Well,
        PinDriver::output(peripherals.pins.gpio14)?,
        PinDriver::input(peripherals.pins.gpio2)?,
        Ets,
        micros_since_boot,
        config.well_height_cm,
    );
    hw_init::init_adc(pins::TDS_ADC1_CHANNEL)?;
    let tds_sensor = TdsSensor::new(pins::TDS_ADC1_CHANNEL);

    // ── 4. Core service ───────────────────────────────────────
    let http_port = config.http_port;
    let service = Arc::new(ReservoirService::new(config, relays, MonotonicClock::new())?);
    service.start(&mut LogEventSink);

    // ── 5. Periodic jobs on the APP core ──────────────────────
    let jobs_service = Arc::clone(&service);
    let _jobs = spawn_on_core(JOBS_TASK, move || {
        let mut scheduler = Scheduler::new();
        let spawned = [
            scheduler.spawn(SamplingJob::new(reservoir_gauge, jobs_service.clone(), LogEventSink)),
            scheduler.spawn(SamplingJob::new(well_gauge, jobs_service.clone(), LogEventSink)),
            scheduler.spawn(SamplingJob::new(tds_sensor, jobs_service.clone(), LogEventSink)),
            scheduler.spawn(ControlJob::new(jobs_service.clone(), LogEventSink)),
            scheduler.spawn(TelemetryJob::new(jobs_service, LogEventSink)),
        ];
        if spawned.contains(&false) {
            error!("Scheduler: job table full, some jobs not running");
        }
        info!("Scheduler: {} jobs running", scheduler.job_count());
        scheduler.run();
    })?;

    // ── 6. Network + control surface ──────────────────────────
    // The controller is already running; a missing network only costs
    // the dashboard.
    let _wifi = match wifi::WifiCredentials::from_build_env() {
        Ok(creds) => Some(wifi::connect(peripherals.modem, sysloop, nvs, &creds)?),
        Err(e) => {
            warn!("WiFi disabled: {}", e);
            None
        }
    };
    let _server = http::serve(ControlSurface::new(service), http_port)?;

    info!("System ready.");
    loop {
        std::thread::park();
    }
}
