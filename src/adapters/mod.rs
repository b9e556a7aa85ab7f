//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                |
//! |------------|----------------|----------------------------|
//! | `http`     | (inbound)      | ESP-IDF HTTP server        |
//! | `log_sink` | EventSink      | Serial log output          |
//! | `time`     | Clock          | ESP32 high-resolution timer|
//! | `wifi`     | (connectivity) | ESP-IDF WiFi STA           |
//!
//! `SensorSource` and `ActuatorSink` are implemented next to the hardware
//! in [`crate::sensors`] and [`crate::drivers::relay`].

pub mod http;
pub mod log_sink;
pub mod time;
pub mod wifi;
