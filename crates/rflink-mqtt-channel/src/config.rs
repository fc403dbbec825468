use serde::Deserialize;

/// MQTT connection configuration, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// MQTT broker hostname.
    pub broker_host: String,
    /// MQTT broker port (default 1883).
    #[serde(default = "default_port")]
    pub broker_port: u16,
    /// MQTT client ID.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Broker username. Credentials are only sent when this is set.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// Upper bound on a single network service call, in milliseconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_ms: u64,
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "RFLinkGateway".to_string()
}

fn default_keepalive() -> u16 {
    120
}

fn default_poll_timeout() -> u64 {
    100
}
