//! Relay bank, ADC bring-up and thread placement.

pub mod hw_init;
pub mod relay;
pub mod task_pin;
