//! Sensor drivers.  Each one implements [`SensorSource`](crate::app::ports::SensorSource)
//! for a single [`Channel`](crate::types::Channel) and is polled by its own
//! [`SamplingJob`](crate::tasks::SamplingJob).

pub mod tds;
pub mod ultrasonic;

pub use tds::TdsSensor;
pub use ultrasonic::UltrasonicGauge;
