//! MQTT transport for the RFLink bridge.
//!
//! Provides the seam between the bridge loop and the broker:
//! - `Channel` trait for publish/subscribe/disconnect (mockable in tests)
//! - `Session` trait for connecting and servicing network I/O
//! - `MqttChannel` / `MqttSession` backed by rumqttc
//! - `MockChannel` / `MockSession` for testing without a broker
//! - `IncomingMessage` classification for subscription traffic

pub mod channel;
pub mod config;
pub mod error;
pub mod handler;
pub mod mock;
pub mod session;

// Re-exports for convenience.
pub use channel::{Channel, MqttChannel};
pub use config::MqttConfig;
pub use error::{MqttError, MqttResult};
pub use handler::{IncomingMessage, classify};
pub use mock::{MockChannel, MockSession};
pub use session::{MqttSession, Session, SessionEvent};
