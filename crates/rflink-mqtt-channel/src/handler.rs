//! Incoming message classification for the bridge loop.
//!
//! Turns raw MQTT publishes on the command subscription into typed
//! `Command`s so the bridge can hand them to the gateway without topic
//! string matching.

use rumqttc::Publish;

use rflink_protocol::commands::Command;
use rflink_protocol::topics;

/// A classified incoming MQTT message.
#[derive(Debug)]
pub enum IncomingMessage {
    /// Command addressed to an RFLink device.
    Command(Command),
    /// Topic too short to parse, or payload is not text.
    Unknown { topic: String, payload: Vec<u8> },
}

/// Classify a raw MQTT publish received under `prefix`.
pub fn classify(publish: &Publish, prefix: &str) -> IncomingMessage {
    let topic = &publish.topic;
    let payload = &publish.payload;

    let Some(parsed) = topics::parse_command_topic(prefix, topic) else {
        return IncomingMessage::Unknown {
            topic: topic.clone(),
            payload: payload.to_vec(),
        };
    };

    match std::str::from_utf8(payload) {
        Ok(text) => IncomingMessage::Command(Command::new(topic.clone(), parsed, text)),
        Err(_) => IncomingMessage::Unknown {
            topic: topic.clone(),
            payload: payload.to_vec(),
        },
    }
}
