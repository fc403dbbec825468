use std::fmt;

use serde::{Deserialize, Serialize};

/// Queue message method, carried as the `method` field on both queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Outbound: publish the task to the broker.
    Publish,
    /// Inbound: a message received on the command subscription.
    Subscribe,
    /// Any other method value. The bridge ignores these on dequeue.
    #[serde(other)]
    Other,
}

/// Outbound work item placed on the outbound queue by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub method: Method,
    /// Topic suffix; the bridge prepends the configured prefix.
    pub topic: String,
    pub payload: Payload,
}

impl Task {
    /// Build a publish task.
    pub fn publish(topic: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            method: Method::Publish,
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Task payload: either text or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Number(serde_json::Number),
    Text(String),
}

impl Payload {
    pub fn is_number(&self) -> bool {
        matches!(self, Payload::Number(_))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Number(n) => write!(f, "{n}"),
            Payload::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Number(n.into())
    }
}

impl From<serde_json::Number> for Payload {
    fn from(n: serde_json::Number) -> Self {
        Payload::Number(n)
    }
}
