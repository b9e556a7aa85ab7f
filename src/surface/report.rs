//! Wire view of a snapshot for the `/sensor` endpoint and telemetry.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::state::SystemSnapshot;
use crate::types::{Channel, PumpId};

/// `{"pump1":..,"pump2":..,"pump3":..,"reservoir":..,"well":..,"flow":..,"tds":..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub pump1: bool,
    pub pump2: bool,
    pub pump3: bool,
    /// Reservoir level, cm, one decimal.
    pub reservoir: f32,
    /// Well level, cm, one decimal.
    pub well: f32,
    /// Nominal flow when any pump runs, else 0 (mL/s, three decimals).
    pub flow: f32,
    /// Dissolved solids, ppm, two decimals.
    pub tds: f32,
}

impl StatusReport {
    pub fn from_snapshot(snap: &SystemSnapshot, config: &SystemConfig) -> Self {
        let flow = if snap.any_pump_on() {
            config.nominal_flow_ml_per_s
        } else {
            0.0
        };
        Self {
            pump1: snap.pump(PumpId::Inflow).is_on,
            pump2: snap.pump(PumpId::Outflow).is_on,
            pump3: snap.pump(PumpId::Auxiliary).is_on,
            reservoir: round_to(snap.reading(Channel::Reservoir).value, 1),
            well: round_to(snap.reading(Channel::Well).value, 1),
            flow: round_to(flow, 3),
            tds: round_to(snap.reading(Channel::Tds).value, 2),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

fn round_to(value: f32, places: i32) -> f32 {
    let scale = 10f32.powi(places);
    (value * scale).round() / scale
}
