//! Shared readings and pump flags: the single source of truth.
//!
//! Sensor jobs write readings, the controller writes pump flags, and the
//! control surface reads snapshots.  Everything sits behind one coarse
//! blocking mutex; traffic is a handful of accesses per second.
//!
//! ```text
//!  SamplingJob ──update_reading──▶ ┌──────────────┐ ◀──snapshot── ControlSurface
//!                                  │ SharedState  │
//!  PumpController ──apply_pump──▶  └──────────────┘
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::types::{Channel, PumpId, PumpState, Reading, Timestamp};

/// The guarded contents.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ControlState {
    readings: [Reading; Channel::COUNT],
    pumps: [PumpState; PumpId::COUNT],
}

impl ControlState {
    const BOOT: Self = Self {
        readings: [Reading::EMPTY; Channel::COUNT],
        pumps: [PumpState::OFF; PumpId::COUNT],
    };
}

/// Point-in-time copy of every reading and pump flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSnapshot {
    pub taken_at: Timestamp,
    pub readings: [Reading; Channel::COUNT],
    pub pumps: [PumpState; PumpId::COUNT],
}

impl SystemSnapshot {
    pub fn reading(&self, channel: Channel) -> Reading {
        self.readings[channel.index()]
    }

    pub fn pump(&self, pump: PumpId) -> PumpState {
        self.pumps[pump.index()]
    }

    pub fn any_pump_on(&self) -> bool {
        self.pumps.iter().any(|p| p.is_on)
    }
}

pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<ControlState>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    /// Zeroed readings, all pumps off, every debounce gate open.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ControlState::BOOT)),
        }
    }

    /// Overwrite the latest reading for `channel`.
    pub fn update_reading(&self, channel: Channel, value: f32, now: Timestamp) {
        self.inner.lock(|cell| {
            cell.borrow_mut().readings[channel.index()] = Reading {
                value,
                taken_at: Some(now),
            };
        });
    }

    /// Consistent copy of all fields under a single guard acquisition.
    pub fn snapshot(&self, now: Timestamp) -> SystemSnapshot {
        self.inner.lock(|cell| {
            let s = cell.borrow();
            SystemSnapshot {
                taken_at: now,
                readings: s.readings,
                pumps: s.pumps,
            }
        })
    }

    /// Copy the current state, reading the time from `now` under the guard.
    ///
    /// Writers stamp with a time read before they lock, so with a monotonic
    /// `now` no stamp in the copy is later than its `taken_at`.
    pub fn snapshot_with(&self, now: impl FnOnce() -> Timestamp) -> SystemSnapshot {
        self.inner.lock(|cell| {
            let s = cell.borrow();
            SystemSnapshot {
                taken_at: now(),
                readings: s.readings,
                pumps: s.pumps,
            }
        })
    }

    /// Record a pump decision.  Only the controller calls this.
    ///
    /// Returns `false` and leaves the pump untouched if `now` precedes the
    /// pump's previous change.
    pub(crate) fn apply_pump_decision(&self, pump: PumpId, is_on: bool, now: Timestamp) -> bool {
        self.inner.lock(|cell| {
            let mut s = cell.borrow_mut();
            let slot = &mut s.pumps[pump.index()];
            if slot.last_change_at.is_some_and(|last| now < last) {
                return false;
            }
            *slot = PumpState {
                is_on,
                last_change_at: Some(now),
            };
            true
        })
    }
}
