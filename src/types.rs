//! Core value types shared by every layer: time, channels, pumps, readings.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Milliseconds since boot on a monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, or 0 if `earlier` is in the future.
    pub const fn saturating_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub const fn saturating_add_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

// ---------------------------------------------------------------------------
// Sensor channels
// ---------------------------------------------------------------------------

/// Every quantity the controller tracks.  One producer task per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    /// Water height in the main reservoir (cm).
    Reservoir = 0,
    /// Water height in the secondary well (cm).
    Well = 1,
    /// Dissolved-solids concentration (ppm).
    Tds = 2,
}

impl Channel {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Reservoir, Self::Well, Self::Tds];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Reservoir | Self::Well => "cm",
            Self::Tds => "ppm",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reservoir => write!(f, "reservoir"),
            Self::Well => write!(f, "well"),
            Self::Tds => write!(f, "tds"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pumps
// ---------------------------------------------------------------------------

/// The fixed set of pumps.  Discriminants are the wire identifiers used by
/// the control surface (`/control?pump=N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PumpId {
    /// Fills the reservoir.
    Inflow = 1,
    /// Drains the reservoir whenever inflow is idle.
    Outflow = 2,
    /// Well pump, permanently on unless level control is enabled.
    Auxiliary = 3,
}

impl PumpId {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Inflow, Self::Outflow, Self::Auxiliary];

    /// Decode a control-surface identifier.
    pub fn from_wire(id: u8) -> Result<Self, ControlError> {
        match id {
            1 => Ok(Self::Inflow),
            2 => Ok(Self::Outflow),
            3 => Ok(Self::Auxiliary),
            _ => Err(ControlError::UnknownPump),
        }
    }

    pub const fn wire_id(self) -> u8 {
        self as u8
    }

    /// Zero-based slot in per-pump arrays.
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for PumpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inflow => write!(f, "inflow"),
            Self::Outflow => write!(f, "outflow"),
            Self::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

// ---------------------------------------------------------------------------
// Readings and pump state
// ---------------------------------------------------------------------------

/// Latest value for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub value: f32,
    /// `None` until the channel's first sample lands.
    pub taken_at: Option<Timestamp>,
}

impl Reading {
    pub const EMPTY: Self = Self {
        value: 0.0,
        taken_at: None,
    };

    pub fn is_present(&self) -> bool {
        self.taken_at.is_some()
    }

    /// The value, if the reading exists and is no older than `max_age_ms`.
    pub fn fresh_value(&self, now: Timestamp, max_age_ms: u64) -> Option<f32> {
        let taken_at = self.taken_at?;
        (now.saturating_since(taken_at) <= max_age_ms).then_some(self.value)
    }
}

/// On/off flag plus the debounce clock for one pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpState {
    pub is_on: bool,
    /// `None` until the pump first switches; the debounce gate is open.
    pub last_change_at: Option<Timestamp>,
}

impl PumpState {
    pub const OFF: Self = Self {
        is_on: false,
        last_change_at: None,
    };
}
