//! MQTT channel: the publish/subscribe side of the broker connection.
//!
//! Wraps `rumqttc::AsyncClient`. Requests are handed to the client's
//! request queue without waiting, so a full queue (broker unreachable for
//! a while) surfaces as a publish error instead of stalling the caller.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};
use crate::session::MqttSession;

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 64;

// ── Channel trait ─────────────────────────────────────────────

/// Abstraction for MQTT publishing, subscribing and disconnecting.
///
/// Enables mocking in tests without a real MQTT broker.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Publish a raw payload to a topic.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()>;

    /// Subscribe to a topic filter.
    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()>;

    /// Request a clean, client-initiated disconnect.
    async fn disconnect(&self) -> MqttResult<()>;
}

// ── MqttChannel ───────────────────────────────────────────────

/// MQTT channel backed by a rumqttc client.
///
/// The matching `MqttSession` owns the event loop and must be serviced for
/// any queued request to reach the broker.
pub struct MqttChannel {
    client: AsyncClient,
}

impl MqttChannel {
    /// Create a channel and its session. Nothing touches the network until
    /// the session connects.
    pub fn new(config: &MqttConfig) -> (Self, MqttSession) {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
        let session = MqttSession::new(eventloop, Duration::from_millis(config.poll_timeout_ms));
        (Self { client }, session)
    }
}

fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
    options.set_keep_alive(Duration::from_secs(config.keepalive_secs.into()));
    if let Some(username) = &config.username {
        options.set_credentials(username, config.password.as_deref().unwrap_or_default());
    }
    options
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        self.client
            .try_publish(topic, qos, false, payload.to_vec())
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.client
            .try_subscribe(filter, qos)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    async fn disconnect(&self) -> MqttResult<()> {
        self.client
            .try_disconnect()
            .map_err(|e| MqttError::Disconnect(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MqttConfig {
        MqttConfig {
            broker_host: "broker.lan".into(),
            broker_port: 1883,
            client_id: "RFLinkGateway".into(),
            username: Some("gateway".into()),
            password: None,
            keepalive_secs: 120,
            poll_timeout_ms: 100,
        }
    }

    #[test]
    fn options_from_config() {
        let options = mqtt_options(&config());
        assert_eq!(options.client_id(), "RFLinkGateway");
        assert_eq!(options.broker_address(), ("broker.lan".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(120));
        assert!(options.credentials().is_some());
    }

    #[test]
    fn no_credentials_without_username() {
        let mut config = config();
        config.username = None;
        config.password = Some("ignored".into());
        assert!(mqtt_options(&config).credentials().is_none());
    }

    #[tokio::test]
    async fn requests_queue_without_broker() {
        let (channel, _session) = MqttChannel::new(&config());
        channel
            .publish("rflink/test", b"1", QoS::AtMostOnce)
            .await
            .unwrap();
        channel
            .subscribe("rflink/+/+/W/+", QoS::AtMostOnce)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn publish_fails_when_request_queue_full() {
        let (channel, _session) = MqttChannel::new(&config());
        for _ in 0..REQUEST_CAPACITY {
            channel
                .publish("rflink/test", b"1", QoS::AtMostOnce)
                .await
                .unwrap();
        }
        let err = channel
            .publish("rflink/test", b"1", QoS::AtMostOnce)
            .await
            .unwrap_err();
        assert!(matches!(err, MqttError::Publish(_)));
    }
}
