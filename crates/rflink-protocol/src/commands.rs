use serde::{Deserialize, Serialize};

use crate::task::Method;
use crate::topics::ParsedTopic;

/// QoS level stamped on every inbound command.
pub const COMMAND_QOS: u8 = 1;

/// Inbound command handed to the gateway after an MQTT message arrives
/// on the command subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub method: Method,
    /// Full topic the message arrived on, prefix included.
    pub topic: String,
    /// RFLink protocol family (e.g. "NewKaku").
    pub family: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub param: String,
    pub payload: String,
    pub qos: u8,
}

impl Command {
    pub fn new(topic: impl Into<String>, parsed: ParsedTopic, payload: impl Into<String>) -> Self {
        Self {
            method: Method::Subscribe,
            topic: topic.into(),
            family: parsed.family,
            device_id: parsed.device_id,
            param: parsed.param,
            payload: payload.into(),
            qos: COMMAND_QOS,
        }
    }
}
