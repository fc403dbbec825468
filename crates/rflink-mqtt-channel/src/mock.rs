//! Mock MQTT channel and session for testing without a real broker.
//!
//! `MockChannel` records every publish, subscription and disconnect and can
//! be told to fail publishes or subscribes. `MockSession` replays scripted poll events and
//! connect outcomes and counts connection attempts.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rumqttc::QoS;

use crate::channel::Channel;
use crate::error::{MqttError, MqttResult};
use crate::session::{Session, SessionEvent};

/// A recorded publish call.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

impl PublishedMessage {
    /// Payload as text, for assertions.
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}

// ── MockChannel ───────────────────────────────────────────────

/// Mock implementation of the `Channel` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscriptions: Mutex<Vec<(String, QoS)>>,
    disconnects: AtomicUsize,
    failing_publishes: AtomicUsize,
    failing_subscribes: AtomicUsize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            failing_publishes: AtomicUsize::new(0),
            failing_subscribes: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` publishes fail with a transport error.
    pub fn fail_next_publishes(&self, count: usize) {
        self.failing_publishes.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` subscribes fail, as a full request queue would.
    pub fn fail_next_subscribes(&self, count: usize) {
        self.failing_subscribes.store(count, Ordering::SeqCst);
    }

    /// Get all successfully published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Get all accepted subscription filters, in order (resubscribes included).
    pub fn subscriptions(&self) -> Vec<(String, QoS)> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Get the last published message.
    pub fn last_published(&self) -> Option<PublishedMessage> {
        self.published.lock().unwrap().last().cloned()
    }

    /// Check whether a subscription was made to the given filter.
    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .any(|(f, _)| f == filter)
    }

    /// Number of disconnect requests.
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        let failing = self
            .failing_publishes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MqttError::Publish("injected failure".into()));
        }

        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
        });
        Ok(())
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        let failing = self
            .failing_subscribes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MqttError::Subscribe("injected failure".into()));
        }

        self.subscriptions
            .lock()
            .unwrap()
            .push((filter.to_string(), qos));
        Ok(())
    }

    async fn disconnect(&self) -> MqttResult<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── MockSession ───────────────────────────────────────────────

/// Mock implementation of the `Session` trait.
///
/// Starts disconnected. Connects succeed unless failures were queued with
/// `fail_next_connects`. Polls replay scripted events in order, then report
/// `Idle`. A scripted `Disconnected` event drops the connection state.
#[derive(Default)]
pub struct MockSession {
    connected: bool,
    events: VecDeque<SessionEvent>,
    failing_connects: usize,
    connect_attempts: usize,
    polls: usize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for a future `poll_once`.
    pub fn push_event(&mut self, event: SessionEvent) {
        self.events.push_back(event);
    }

    /// Make the next `count` connect attempts fail.
    pub fn fail_next_connects(&mut self, count: usize) {
        self.failing_connects = count;
    }

    /// Drop the connection without emitting an event.
    pub fn drop_connection(&mut self) {
        self.connected = false;
    }

    /// Total connect attempts, initial connect and reconnects included.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    /// Number of `poll_once` calls made while connected.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Scripted events not yet consumed.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn connect(&mut self) -> MqttResult<()> {
        self.connect_attempts += 1;
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(MqttError::Connection("injected failure".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn poll_once(&mut self) -> MqttResult<SessionEvent> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        self.polls += 1;

        let event = self.events.pop_front().unwrap_or(SessionEvent::Idle);
        if matches!(event, SessionEvent::Disconnected { .. }) {
            self.connected = false;
        }
        Ok(event)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
