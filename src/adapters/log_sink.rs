//! Log-based event sink adapter.
//!
//! Writes every [`AppEvent`] to the ESP-IDF logger (UART on the board,
//! whatever `log` backend the host installs).  Routine switching is `info`,
//! gate and staleness chatter is `debug`, anything an operator should
//! look at is `warn`.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::control::controller::TransitionCause;
use crate::error::Error;

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(at) => {
                info!("START | controller up at {}", at);
            }
            AppEvent::PumpSwitched(t) => {
                let cause = match t.cause {
                    TransitionCause::Startup => "startup",
                    TransitionCause::Hysteresis => "level",
                    TransitionCause::Coupled => "coupled",
                    TransitionCause::Manual => "manual",
                };
                info!("PUMP  | {} -> {} ({}) at {}", t.pump, on_off(t.is_on), cause, t.at);
            }
            AppEvent::SwitchDeferred(d) => {
                debug!("GATE  | {} wants {}, retry in {} ms", d.pump, on_off(d.desired), d.retry_in_ms);
            }
            AppEvent::ReadingStale(channel) => {
                debug!("STALE | {} reading absent or too old, holding", channel);
            }
            AppEvent::ReadingRejected { channel, value } => {
                warn!("REJECT| {} sample {} not recorded", channel, value);
            }
            AppEvent::ActuatorFault { pump, error } => {
                warn!("FAULT | {} {}", pump, Error::from(*error));
            }
            AppEvent::ToggleDeferred { pump, retry_in_ms } => {
                info!("TOGGLE| {} switched recently, retry in {} ms", pump, retry_in_ms);
            }
            AppEvent::ToggleLocked(pump) => {
                info!("TOGGLE| {} is locked on", pump);
            }
            AppEvent::ToggleRejected { wire_id, error } => match wire_id {
                Some(id) => warn!("TOGGLE| pump {}: {}", id, error),
                None => warn!("TOGGLE| unparseable pump argument: {}", error),
            },
            AppEvent::Telemetry(r) => {
                info!(
                    "TELEM | pumps={}/{}/{} | reservoir={:.1}cm well={:.1}cm | \
                     flow={:.3}mL/s | tds={:.2}ppm",
                    on_off(r.pump1),
                    on_off(r.pump2),
                    on_off(r.pump3),
                    r.reservoir,
                    r.well,
                    r.flow,
                    r.tds,
                );
            }
        }
    }
}
