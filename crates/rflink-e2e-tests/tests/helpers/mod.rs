//! Shared test harness for E2E tests.
//!
//! Wires a `Bridge` to mock transports and the gateway side of the queue
//! pair, so tests drive the real loop one iteration at a time.

#![allow(dead_code)]

use rumqttc::{Publish, QoS};

use rflink_bridge::bridge::Bridge;
use rflink_bridge::config::BridgeSettings;
use rflink_bridge::queue::{GatewayHandle, queue_pair};
use rflink_mqtt_channel::{MockChannel, MockSession, SessionEvent};
use rflink_protocol::{Command, PayloadFormat, Task};

pub const PREFIX: &str = "rflink";

/// End-to-end harness: a started bridge plus the gateway's queue ends.
pub struct TestHarness {
    pub bridge: Bridge<MockChannel, MockSession>,
    pub gateway: GatewayHandle,
}

impl TestHarness {
    /// Start a bridge in JSON format with zero-length sleeps.
    pub async fn start() -> Self {
        Self::start_with(PayloadFormat::Json).await
    }

    pub async fn start_with(format: PayloadFormat) -> Self {
        let (gateway, queues) = queue_pair();
        let settings = BridgeSettings {
            format,
            idle_sleep_ms: 0,
            reconnect_delay_secs: 0,
            ..BridgeSettings::new(PREFIX)
        };
        let bridge = Bridge::start(MockChannel::new(), MockSession::new(), settings, queues)
            .await
            .expect("bridge should start against mock session");
        Self { bridge, gateway }
    }

    /// Enqueue a publish task as the gateway would.
    pub fn send_task(&self, topic: &str, payload: &str) {
        self.gateway
            .tasks
            .send(Task::publish(topic, payload))
            .expect("outbound queue open");
    }

    /// Script a broker message for the next network service.
    pub fn receive(&mut self, topic: &str, payload: &str) {
        self.bridge
            .session_mut()
            .push_event(SessionEvent::Message(Publish::new(
                topic,
                QoS::AtMostOnce,
                payload,
            )));
    }

    /// Run `n` loop iterations.
    pub async fn steps(&mut self, n: usize) {
        for _ in 0..n {
            self.bridge.step().await;
        }
    }

    /// Drain every command currently on the inbound queue.
    pub fn commands(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        while let Ok(cmd) = self.gateway.commands.try_recv() {
            out.push(cmd);
        }
        out
    }

    /// Published (topic, payload) pairs, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.bridge
            .channel()
            .published()
            .into_iter()
            .map(|m| (m.topic.clone(), m.payload_str().to_string()))
            .collect()
    }
}
