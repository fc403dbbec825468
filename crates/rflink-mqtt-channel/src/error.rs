//! MQTT channel error types.

use thiserror::Error;

/// Errors that can occur during MQTT operations.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    #[error("disconnect error: {0}")]
    Disconnect(String),

    #[error("not connected to broker")]
    NotConnected,
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;
