//! Bridge configuration, loadable from TOML.

use std::time::Duration;

use rumqttc::QoS;
use serde::{Deserialize, Deserializer, de};

use rflink_mqtt_channel::MqttConfig;
use rflink_protocol::PayloadFormat;

/// Top-level configuration for the bridge process.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// MQTT connection settings.
    pub mqtt: MqttConfig,
    /// Topic layout, payload format and loop timing.
    pub bridge: BridgeSettings,
}

impl GatewayConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeSettings {
    /// Topic prefix for everything the bridge publishes or subscribes to.
    pub prefix: String,
    /// Outbound payload format.
    #[serde(default)]
    pub format: PayloadFormat,
    /// QoS used for outbound publishes and the command subscription.
    #[serde(default = "default_qos", deserialize_with = "deserialize_qos")]
    pub qos: QoS,
    /// Sleep when the outbound queue is empty, in milliseconds.
    #[serde(default = "default_idle_sleep")]
    pub idle_sleep_ms: u64,
    /// Wait after a failed reconnect, in seconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl BridgeSettings {
    /// Settings with default format, QoS and timing.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            format: PayloadFormat::default(),
            qos: default_qos(),
            idle_sleep_ms: default_idle_sleep(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

fn default_qos() -> QoS {
    QoS::AtMostOnce
}

fn default_idle_sleep() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    5
}

fn deserialize_qos<'de, D: Deserializer<'de>>(deserializer: D) -> Result<QoS, D::Error> {
    match u8::deserialize(deserializer)? {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(de::Error::custom(format!(
            "invalid QoS level {other}, expected 0, 1 or 2"
        ))),
    }
}
