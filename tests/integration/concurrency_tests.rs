//! The service shared between sampling, control, HTTP and reader threads.
//!
//! Only the control thread advances the clock; everyone else reads it, so
//! late callers carry a stale `now` into the guards the way a slow HTTP
//! handler would.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use reservoir::config::SystemConfig;
use reservoir::types::{Channel, PumpId};

use crate::mock_hw::Rig;

const STEPS: u64 = 2_000;
const STEP_MS: u64 = 37;

#[test]
fn debounce_holds_under_contention() {
    let mut rig = Rig::started(SystemConfig::default());
    rig.reservoir(4.0);
    let done = Arc::new(AtomicBool::new(false));
    let min_interval = rig.service.config().min_change_interval_ms;

    let sampler = {
        let service = rig.service.clone();
        let mut sink = rig.sink.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut i = 0u32;
            while !done.load(Ordering::Relaxed) {
                let level = (i % 13) as f32 * 0.5;
                service.record(Channel::Reservoir, level, &mut sink);
                service.record(Channel::Well, 3.0, &mut sink);
                i = i.wrapping_add(1);
                thread::yield_now();
            }
        })
    };

    let operator = {
        let service = rig.service.clone();
        let mut sink = rig.sink.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut id = 1u8;
            while !done.load(Ordering::Relaxed) {
                let _ = service.request_toggle(id, &mut sink);
                id = id % 4 + 1;
                thread::yield_now();
            }
        })
    };

    let reader = {
        let service = rig.service.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut seen = 0u64;
            while !done.load(Ordering::Relaxed) {
                let snap = service.snapshot();
                assert!(snap.pump(PumpId::Auxiliary).is_on);
                let r = snap.reading(Channel::Reservoir);
                assert!((0.0..=18.0).contains(&r.value));
                for pump in PumpId::ALL {
                    let changed = snap.pump(pump).last_change_at;
                    assert!(changed <= Some(snap.taken_at), "{pump} changed after the snapshot");
                }
                if snap.pump(PumpId::Inflow).last_change_at.is_some() {
                    assert!(r.taken_at.is_some(), "inflow switched with no reservoir level");
                    assert!(r.taken_at <= Some(snap.taken_at));
                }
                seen += 1;
            }
            seen
        })
    };

    let mut control_sink = rig.sink.clone();
    for step in 1..=STEPS {
        rig.clock.set(step * STEP_MS);
        rig.service.control_tick(&mut control_sink);
    }
    done.store(true, Ordering::Relaxed);

    sampler.join().unwrap();
    operator.join().unwrap();
    assert!(reader.join().unwrap() > 0);

    let switches = rig.sink.switches();
    assert!(!switches.is_empty());
    for pump in [PumpId::Inflow, PumpId::Outflow] {
        let mut times: Vec<u64> = switches
            .iter()
            .filter(|t| t.pump == pump)
            .map(|t| t.at.as_millis())
            .collect();
        times.sort_unstable();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] > min_interval, "{pump} switched at {} and {}", pair[0], pair[1]);
        }
    }

    // Relays end where the flags say.
    let snap = rig.service.snapshot();
    for pump in PumpId::ALL {
        assert_eq!(rig.relays.level(pump), Some(snap.pump(pump).is_on), "{pump}");
    }
}
