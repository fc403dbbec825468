//! The bridge loop: drains the outbound queue to the broker, turns
//! subscription traffic into inbound commands, and keeps the connection up.
//!
//! Everything runs serially on one task. Each iteration pops at most one
//! outbound task (or idles briefly), services the network once, then
//! reconnects if the session is down.

use rflink_mqtt_channel::{
    Channel, IncomingMessage, MqttError, MqttResult, Session, SessionEvent, classify,
};
use rflink_protocol::{Method, Task, payload, topics};

use crate::config::BridgeSettings;
use crate::queue::BridgeQueues;

/// Upper bound on polls spent flushing a clean disconnect on close.
const CLOSE_POLL_LIMIT: usize = 10;

/// Bridge process owning the MQTT channel and session exclusively.
pub struct Bridge<C: Channel, S: Session> {
    channel: C,
    session: S,
    settings: BridgeSettings,
    queues: BridgeQueues,
    filter: String,
    /// Whether the command filter is registered on the current connection.
    subscribed: bool,
}

impl<C: Channel, S: Session> Bridge<C, S> {
    /// Connect to the broker and subscribe to the command filter.
    ///
    /// A failed initial connection is returned to the caller; there is no
    /// retry at this stage.
    pub async fn start(
        channel: C,
        mut session: S,
        settings: BridgeSettings,
        queues: BridgeQueues,
    ) -> MqttResult<Self> {
        tracing::info!(prefix = %settings.prefix, "starting mqtt bridge");
        session.connect().await?;

        let filter = topics::command_filter(&settings.prefix);
        channel.subscribe(&filter, settings.qos).await?;
        tracing::info!(filter = %filter, "subscribed to commands");

        Ok(Self {
            channel,
            session,
            settings,
            queues,
            filter,
            subscribed: true,
        })
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Run the bridge loop forever.
    pub async fn run(&mut self) {
        loop {
            self.step().await;
        }
    }

    /// One loop iteration.
    pub async fn step(&mut self) {
        match self.queues.try_next() {
            Some(task) => self.dispatch(task).await,
            None => tokio::time::sleep(self.settings.idle_sleep()).await,
        }

        self.service().await;

        if !self.session.is_connected() {
            tracing::debug!("broker connection down, reconnecting");
            if let Err(e) = self.reconnect().await {
                tracing::debug!(
                    error = %e,
                    delay_secs = self.settings.reconnect_delay_secs,
                    "reconnect failed, waiting before next attempt"
                );
                tokio::time::sleep(self.settings.reconnect_delay()).await;
            }
        } else if !self.subscribed {
            self.resubscribe().await;
        }
    }

    async fn dispatch(&self, task: Task) {
        match task.method {
            Method::Publish => self.publish(task).await,
            other => {
                tracing::debug!(method = ?other, topic = %task.topic, "ignoring non-publish task");
            }
        }
    }

    /// Publish one task, putting it back on the outbound queue if the
    /// transport rejects it.
    pub async fn publish(&self, task: Task) {
        let topic = topics::outbound(&self.settings.prefix, &task.topic);
        let body = payload::encode(self.settings.format, &task.payload);

        match self
            .channel
            .publish(&topic, body.as_bytes(), self.settings.qos)
            .await
        {
            Ok(()) => {
                tracing::debug!(topic = %topic, payload = %body, "sending");
            }
            Err(e) => {
                tracing::error!(error = %e, topic = %topic, "publish problem, requeueing task");
                self.queues.requeue(task);
            }
        }
    }

    async fn service(&mut self) {
        match self.session.poll_once().await {
            Ok(SessionEvent::Message(publish)) => self.on_message(&publish),
            Ok(SessionEvent::Published(pkid)) => {
                tracing::debug!(pkid, "message published");
            }
            Ok(SessionEvent::Disconnected { clean }) => self.on_disconnect(clean).await,
            Ok(SessionEvent::Connected) => tracing::debug!("connection acknowledged"),
            Ok(SessionEvent::Idle) => {}
            Err(MqttError::NotConnected) => {}
            Err(e) => tracing::warn!(error = %e, "mqtt network service failed"),
        }
    }

    fn on_message(&self, publish: &rumqttc::Publish) {
        tracing::debug!(topic = %publish.topic, bytes = publish.payload.len(), "message received");

        match classify(publish, &self.settings.prefix) {
            IncomingMessage::Command(command) => {
                if !self.queues.deliver(command) {
                    tracing::error!(topic = %publish.topic, "inbound queue closed, command dropped");
                }
            }
            IncomingMessage::Unknown { topic, payload } => {
                tracing::warn!(topic = %topic, bytes = payload.len(), "ignoring unparseable message");
            }
        }
    }

    async fn on_disconnect(&mut self, clean: bool) {
        if clean {
            tracing::info!("disconnected from broker");
            return;
        }

        tracing::error!("unexpected disconnection");
        if let Err(e) = self.reconnect().await {
            tracing::error!(error = %e, "immediate reconnect failed");
        }
    }

    /// Re-establish the session. Only a session failure is an error; a
    /// failed resubscribe is retried by later iterations.
    async fn reconnect(&mut self) -> MqttResult<()> {
        // A clean session forgets subscriptions across reconnects.
        self.subscribed = false;
        self.session.reconnect().await?;
        tracing::info!("reconnected to broker");
        self.resubscribe().await;
        Ok(())
    }

    async fn resubscribe(&mut self) {
        match self.channel.subscribe(&self.filter, self.settings.qos).await {
            Ok(()) => {
                self.subscribed = true;
                tracing::info!(filter = %self.filter, "resubscribed to commands");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    filter = %self.filter,
                    "resubscribe failed, retrying next iteration"
                );
            }
        }
    }

    /// Disconnect cleanly from the broker.
    pub async fn close(&mut self) {
        tracing::info!("closing connection");
        if let Err(e) = self.channel.disconnect().await {
            tracing::warn!(error = %e, "disconnect request failed");
            return;
        }

        for _ in 0..CLOSE_POLL_LIMIT {
            match self.session.poll_once().await {
                Ok(SessionEvent::Disconnected { .. }) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}
