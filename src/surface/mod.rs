//! Control surface: status queries and manual overrides.
//!
//! Routing, JSON formatting and page templating live here as plain
//! functions over [`ReservoirService`]; the HTTP adapter only moves bytes.
//!
//! | Route                | Result                                        |
//! |----------------------|-----------------------------------------------|
//! | `/`                  | 200, HTML dashboard                           |
//! | `/sensor`            | 200, JSON [`StatusReport`]                    |
//! | `/control?pump=N`    | 200 switched, 409 debounced/locked, 400 bad id |
//! | anything else        | 404                                           |

pub mod report;

use std::sync::Arc;

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorSink, Clock, EventSink};
use crate::app::service::ReservoirService;
use crate::control::controller::{ToggleAck, ToggleOutcome};
use crate::error::ControlError;
use crate::state::SystemSnapshot;

pub use report::StatusReport;

const PAGE_TEMPLATE: &str = include_str!("page.html");

pub const CONTENT_HTML: &str = "text/html";
pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_TEXT: &str = "text/plain";

/// A fully formed reply, independent of the HTTP stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, CONTENT_TEXT, body)
    }
}

pub struct ControlSurface<A, C> {
    service: Arc<ReservoirService<A, C>>,
}

impl<A, C> Clone for ControlSurface<A, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<A: ActuatorSink, C: Clock> ControlSurface<A, C> {
    pub fn new(service: Arc<ReservoirService<A, C>>) -> Self {
        Self { service }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn get_status(&self) -> SystemSnapshot {
        self.service.snapshot()
    }

    pub fn status_report(&self) -> StatusReport {
        self.service.status_report()
    }

    pub fn status_json(&self) -> String {
        self.status_report().to_json()
    }

    /// Dashboard page with the tank geometry filled in.
    pub fn render_page(&self) -> String {
        let config = self.service.config();
        PAGE_TEMPLATE
            .replace("%MAX_RESERVOIR%", &config.reservoir_height_cm.to_string())
            .replace("%MAX_WELL%", &config.well_height_cm.to_string())
            .replace("%MAX_TDS%", &config.tds_max_ppm.to_string())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Toggle the pump named by a raw query argument (`"1"`, `"2"`, `"3"`).
    pub fn request_toggle(&self, raw: &str, sink: &mut impl EventSink) -> Result<ToggleAck, ControlError> {
        match raw.trim().parse::<u8>() {
            Ok(wire_id) => self.service.request_toggle(wire_id, sink),
            Err(_) => {
                let error = ControlError::UnknownPump;
                sink.emit(&AppEvent::ToggleRejected { wire_id: None, error });
                Err(error)
            }
        }
    }

    // ── Routing ───────────────────────────────────────────────

    /// Route a request URI (path plus optional `?query`).
    pub fn handle_uri(&self, uri: &str, sink: &mut impl EventSink) -> Response {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        self.handle(path, query, sink)
    }

    pub fn handle(&self, path: &str, query: &str, sink: &mut impl EventSink) -> Response {
        match path {
            "/" => Response::new(200, CONTENT_HTML, self.render_page()),
            "/sensor" => Response::new(200, CONTENT_JSON, self.status_json()),
            "/control" => match query_arg(query, "pump") {
                Some(raw) => self.control_response(raw, sink),
                None => Response::text(400, "Bad Request"),
            },
            _ => Response::text(404, "Not Found"),
        }
    }

    fn control_response(&self, raw: &str, sink: &mut impl EventSink) -> Response {
        match self.request_toggle(raw, sink) {
            Ok(ack) => {
                let id = ack.pump.wire_id();
                match ack.outcome {
                    ToggleOutcome::Switched { is_on } => {
                        Response::text(200, format!("Pump {id} {}", if is_on { "on" } else { "off" }))
                    }
                    ToggleOutcome::Debounced { retry_in_ms } => {
                        Response::text(409, format!("Pump {id} switched recently, retry in {retry_in_ms} ms"))
                    }
                    ToggleOutcome::Locked => Response::text(409, format!("Pump {id} is locked on")),
                }
            }
            Err(e) => Response::text(400, e.to_string()),
        }
    }
}

/// Value of `key` in an `a=1&b=2` query string.  A bare `key` yields `""`.
pub fn query_arg<'q>(query: &'q str, key: &str) -> Option<&'q str> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
