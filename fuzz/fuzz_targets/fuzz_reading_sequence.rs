//! Fuzz target: reading sequences through the controller
//!
//! Interprets the input as a stream of (time step, channel, raw value,
//! action) records and drives the service with it, checking:
//! - No panics, including for NaN / infinite / negative samples
//! - Stored readings always lie inside their channel range
//! - No pump switches twice within the minimum change interval
//!
//! cargo fuzz run fuzz_reading_sequence

#![no_main]

use std::sync::atomic::{AtomicU64, Ordering};

use libfuzzer_sys::fuzz_target;
use reservoir::app::events::AppEvent;
use reservoir::app::ports::{ActuatorSink, Clock, EventSink};
use reservoir::app::service::ReservoirService;
use reservoir::config::SystemConfig;
use reservoir::error::ActuatorError;
use reservoir::types::{Channel, PumpId, Timestamp};

struct NullRelays;

impl ActuatorSink for NullRelays {
    fn set(&mut self, _: PumpId, _: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
}

static NOW_MS: AtomicU64 = AtomicU64::new(0);

struct StepClock;

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(NOW_MS.load(Ordering::Relaxed))
    }
}

#[derive(Default)]
struct LastSwitch([Option<u64>; PumpId::COUNT]);

impl EventSink for LastSwitch {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::PumpSwitched(t) = event {
            let at = t.at.as_millis();
            let slot = &mut self.0[t.pump.index()];
            if let Some(prev) = *slot {
                assert!(at - prev > 2_000, "{} switched at {} and {}", t.pump, prev, at);
            }
            *slot = Some(at);
        }
    }
}

fuzz_target!(|data: &[u8]| {
    NOW_MS.store(0, Ordering::Relaxed);
    let config = SystemConfig::default();
    let Ok(service) = ReservoirService::new(config.clone(), NullRelays, StepClock) else {
        return;
    };
    let mut sink = LastSwitch::default();
    service.start(&mut sink);

    let mut now = 0u64;
    for rec in data.chunks_exact(7) {
        now += u64::from(u16::from_le_bytes([rec[0], rec[1]]));
        NOW_MS.store(now, Ordering::Relaxed);

        let channel = Channel::ALL[usize::from(rec[2]) % Channel::COUNT];
        let value = f32::from_le_bytes([rec[3], rec[4], rec[5], rec[6]]);
        service.record(channel, value, &mut sink);

        match rec[2] >> 4 {
            0..=9 => {
                service.control_tick(&mut sink);
            }
            10..=12 => {
                let _ = service.request_toggle(rec[3] % 5, &mut sink);
            }
            _ => {}
        }

        let snap = service.snapshot();
        for ch in Channel::ALL {
            let r = snap.reading(ch);
            let (lo, hi) = config.channel_range(ch);
            if r.is_present() {
                assert!(r.value >= lo && r.value <= hi, "{} = {}", ch, r.value);
            }
        }
    }
});
