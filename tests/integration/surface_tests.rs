//! Control surface over a live service: routes, status codes, toggles.

use reservoir::app::events::AppEvent;
use reservoir::config::{AuxiliaryMode, SystemConfig};
use reservoir::control::hysteresis::HysteresisBand;
use reservoir::error::ControlError;
use reservoir::surface::{CONTENT_HTML, CONTENT_JSON, ControlSurface};
use reservoir::types::PumpId;

use crate::mock_hw::{RecordingRelays, ManualClock, Rig};

fn surface(rig: &Rig) -> ControlSurface<RecordingRelays, ManualClock> {
    ControlSurface::new(rig.service.clone())
}

#[test]
fn dashboard_has_tank_geometry() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let page = surface(&rig).handle_uri("/", &mut sink);
    assert_eq!(page.status, 200);
    assert_eq!(page.content_type, CONTENT_HTML);
    assert!(!page.body.contains("%MAX_"));
    assert!(page.body.contains("18"));
}

#[test]
fn sensor_json_after_boot() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let reply = surface(&rig).handle_uri("/sensor", &mut sink);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type, CONTENT_JSON);
    assert_eq!(
        reply.body,
        r#"{"pump1":false,"pump2":false,"pump3":true,"reservoir":0.0,"well":0.0,"flow":26.785,"tds":0.0}"#
    );
}

#[test]
fn toggle_inflow_then_debounced() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let s = surface(&rig);

    rig.at(100);
    let first = s.handle_uri("/control?pump=1", &mut sink);
    assert_eq!((first.status, first.body.as_str()), (200, "Pump 1 on"));
    assert!(rig.is_on(PumpId::Inflow));

    rig.at(1_100);
    let second = s.handle_uri("/control?pump=1", &mut sink);
    assert_eq!(second.status, 409);
    assert_eq!(second.body, "Pump 1 switched recently, retry in 1001 ms");
    assert!(rig.is_on(PumpId::Inflow));
    assert!(sink.events().iter().any(|e| matches!(e, AppEvent::ToggleDeferred { pump: PumpId::Inflow, .. })));
}

#[test]
fn toggling_outflow_goes_through_the_gate() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let s = surface(&rig);

    rig.at(0);
    assert_eq!(s.handle_uri("/control?pump=2", &mut sink).body, "Pump 2 on");
    rig.at(500);
    assert_eq!(s.handle_uri("/control?pump=2", &mut sink).status, 409);
}

#[test]
fn auxiliary_refuses_manual_control() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let reply = surface(&rig).handle_uri("/control?pump=3", &mut sink);
    assert_eq!((reply.status, reply.body.as_str()), (409, "Pump 3 is locked on"));
    assert!(rig.is_on(PumpId::Auxiliary));
}

#[test]
fn level_controlled_auxiliary_accepts_toggles() {
    let config = SystemConfig {
        auxiliary: AuxiliaryMode::LevelControlled(HysteresisBand {
            on_below: 1.0,
            off_at: 3.0,
        }),
        ..SystemConfig::default()
    };
    let rig = Rig::started(config);
    let mut sink = rig.sink.clone();

    // The startup seed closes the gate for one window.
    rig.at(2_001);
    let reply = surface(&rig).handle_uri("/control?pump=3", &mut sink);
    assert_eq!((reply.status, reply.body.as_str()), (200, "Pump 3 off"));
}

#[test]
fn bad_arguments_leave_pumps_alone() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let s = surface(&rig);
    let before = rig.service.snapshot();

    for uri in ["/control?pump=0", "/control?pump=4", "/control?pump=abc", "/control?pump=", "/control?pump=999"] {
        let reply = s.handle_uri(uri, &mut sink);
        assert_eq!((reply.status, reply.body.as_str()), (400, "Unknown pump"), "{uri}");
    }
    assert_eq!(s.handle_uri("/control", &mut sink).status, 400);
    assert_eq!(s.handle_uri("/control?valve=1", &mut sink).body, "Bad Request");

    let after = rig.service.snapshot();
    for pump in PumpId::ALL {
        assert_eq!(before.pump(pump), after.pump(pump));
    }
    assert!(sink.events().iter().any(|e| matches!(
        e,
        AppEvent::ToggleRejected {
            wire_id: Some(4),
            error: ControlError::UnknownPump
        }
    )));
}

#[test]
fn unknown_path_is_404() {
    let rig = Rig::started(SystemConfig::default());
    let mut sink = rig.sink.clone();
    let reply = surface(&rig).handle_uri("/update", &mut sink);
    assert_eq!((reply.status, reply.body.as_str()), (404, "Not Found"));
}
