//! MQTT session: connection state and network servicing.
//!
//! The session owns the rumqttc `EventLoop`. Each call to `poll_once`
//! services the network once, bounded by the configured poll timeout, and
//! reports what happened as a `SessionEvent`. Reconnects are explicit: a
//! disconnected session does not touch the network until `reconnect` is
//! called.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{ConnectReturnCode, Event, EventLoop, Outgoing, Packet, Publish};
use tokio::time;

use crate::error::{MqttError, MqttResult};

/// Outcome of servicing the network once.
#[derive(Debug)]
pub enum SessionEvent {
    /// Broker acknowledged a connection.
    Connected,
    /// A message arrived on one of our subscriptions.
    Message(Publish),
    /// The broker acknowledged (or, at QoS 0, we sent) a publish.
    Published(u16),
    /// The connection dropped. `clean` is true only for client-initiated
    /// disconnects.
    Disconnected { clean: bool },
    /// Nothing of interest happened within the poll window.
    Idle,
}

/// Connection-level side of an MQTT client.
#[async_trait]
pub trait Session: Send {
    /// Establish the connection, returning once the broker has answered.
    async fn connect(&mut self) -> MqttResult<()>;

    /// Service network I/O once. Fails with `NotConnected` while down.
    async fn poll_once(&mut self) -> MqttResult<SessionEvent>;

    /// Whether the last known connection state is up.
    fn is_connected(&self) -> bool;

    /// Re-establish a dropped connection.
    async fn reconnect(&mut self) -> MqttResult<()> {
        self.connect().await
    }
}

// ── MqttSession ───────────────────────────────────────────────

pub struct MqttSession {
    eventloop: EventLoop,
    poll_timeout: Duration,
    connected: bool,
}

impl MqttSession {
    pub(crate) fn new(eventloop: EventLoop, poll_timeout: Duration) -> Self {
        Self {
            eventloop,
            poll_timeout,
            connected: false,
        }
    }
}

#[async_trait]
impl Session for MqttSession {
    async fn connect(&mut self) -> MqttResult<()> {
        if self.connected {
            return Ok(());
        }

        // rumqttc dials on the first poll after a drop; ConnAck is the first
        // event it yields. Bounded by the client's connection timeout.
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(MqttError::Connection(format!(
                            "broker refused connection: {:?}",
                            ack.code
                        )));
                    }
                    self.connected = true;
                    tracing::info!(session_present = ack.session_present, "connected to broker");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => return Err(MqttError::Connection(e.to_string())),
            }
        }
    }

    async fn poll_once(&mut self) -> MqttResult<SessionEvent> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }

        let Ok(polled) = time::timeout(self.poll_timeout, self.eventloop.poll()).await else {
            return Ok(SessionEvent::Idle);
        };

        let event = match polled {
            Ok(Event::Incoming(Packet::Publish(publish))) => SessionEvent::Message(publish),
            Ok(Event::Incoming(Packet::PubAck(ack))) => SessionEvent::Published(ack.pkid),
            Ok(Event::Incoming(Packet::PubComp(comp))) => SessionEvent::Published(comp.pkid),
            Ok(Event::Outgoing(Outgoing::Publish(0))) => SessionEvent::Published(0),
            Ok(Event::Incoming(Packet::ConnAck(_))) => SessionEvent::Connected,
            Ok(Event::Incoming(Packet::Disconnect)) => {
                self.connected = false;
                SessionEvent::Disconnected { clean: false }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                self.connected = false;
                SessionEvent::Disconnected { clean: true }
            }
            Ok(_) => SessionEvent::Idle,
            Err(e) => {
                self.connected = false;
                tracing::warn!(error = %e, "mqtt network error");
                SessionEvent::Disconnected { clean: false }
            }
        };
        Ok(event)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::channel::{Channel, MqttChannel};
    use crate::config::MqttConfig;

    /// CONNACK, MQTT 3.1.1: session not present, connection accepted.
    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

    /// Accept one client, read its CONNECT and acknowledge it.
    async fn accept_and_ack(listener: &TcpListener) -> TcpStream {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 256];
        let n = socket.read(&mut buf).await.unwrap();
        assert_eq!(buf[0] >> 4, 1, "expected CONNECT, got {:?}", &buf[..n]);
        socket.write_all(&CONNACK).await.unwrap();
        socket
    }

    fn local_config(port: u16) -> MqttConfig {
        MqttConfig {
            broker_port: port,
            poll_timeout_ms: 1_000,
            ..unreachable_config()
        }
    }

    /// Poll until the session reports a disconnect.
    async fn next_disconnect(session: &mut MqttSession) -> SessionEvent {
        for _ in 0..10 {
            let event = session.poll_once().await.unwrap();
            if matches!(event, SessionEvent::Disconnected { .. }) {
                return event;
            }
        }
        panic!("session never reported a disconnect");
    }

    fn unreachable_config() -> MqttConfig {
        MqttConfig {
            // Nothing listens on port 1 locally; the dial fails fast.
            broker_host: "127.0.0.1".into(),
            broker_port: 1,
            client_id: "RFLinkGateway".into(),
            username: None,
            password: None,
            keepalive_secs: 120,
            poll_timeout_ms: 10,
        }
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let (_channel, session) = MqttChannel::new(&unreachable_config());
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn poll_while_disconnected_does_not_dial() {
        let (_channel, mut session) = MqttChannel::new(&unreachable_config());
        let err = session.poll_once().await.unwrap_err();
        assert!(matches!(err, MqttError::NotConnected));
    }

    #[tokio::test]
    async fn connect_to_unreachable_broker_fails() {
        let (_channel, mut session) = MqttChannel::new(&unreachable_config());
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, MqttError::Connection(_)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn broker_closing_socket_is_unclean() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let broker = tokio::spawn(async move {
            let socket = accept_and_ack(&listener).await;
            drop(socket);
        });

        let (_channel, mut session) = MqttChannel::new(&local_config(port));
        session.connect().await.unwrap();
        assert!(session.is_connected());
        broker.await.unwrap();

        let event = next_disconnect(&mut session).await;
        assert!(matches!(event, SessionEvent::Disconnected { clean: false }));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn client_disconnect_is_clean() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let broker = tokio::spawn(async move {
            let mut socket = accept_and_ack(&listener).await;
            // Hold the connection until the client hangs up.
            let mut buf = [0u8; 64];
            while socket.read(&mut buf).await.unwrap_or(0) > 0 {}
        });

        let (channel, mut session) = MqttChannel::new(&local_config(port));
        session.connect().await.unwrap();
        channel.disconnect().await.unwrap();

        let event = next_disconnect(&mut session).await;
        assert!(matches!(event, SessionEvent::Disconnected { clean: true }));
        assert!(!session.is_connected());

        drop(session);
        broker.await.unwrap();
    }
}
