//! RFLink MQTT bridge library crate, for the bridge process.
//!
//! Re-exports all modules so external crates (e.g. `rflink-e2e-tests`) can
//! drive the `Bridge` with mock transports.

pub mod bridge;
pub mod config;
pub mod queue;
pub mod stdio;
