//! RFLink MQTT bridge: republishes gateway tasks to a broker and turns
//! command subscriptions into gateway commands.
//!
//! Tasks are read as JSON lines on stdin; commands are written as JSON
//! lines on stdout. Logs go to stderr.

use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use rflink_bridge::bridge::Bridge;
use rflink_bridge::config::GatewayConfig;
use rflink_bridge::queue::{GatewayHandle, queue_pair};
use rflink_bridge::stdio;
use rflink_mqtt_channel::MqttChannel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rflink-bridge starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/rflink/bridge.toml".to_string());

    let config = GatewayConfig::from_file(&config_path)?;
    tracing::info!(
        broker = %config.mqtt.broker_host,
        port = config.mqtt.broker_port,
        prefix = %config.bridge.prefix,
        "config loaded"
    );

    // ── Queues + MQTT ───────────────────────────────────────────
    let (handle, queues) = queue_pair();
    let (channel, session) = MqttChannel::new(&config.mqtt);
    let mut bridge = Bridge::start(channel, session, config.bridge, queues).await?;

    // ── Gateway side over stdio ─────────────────────────────────
    let GatewayHandle { tasks, commands } = handle;
    tokio::spawn(stdio::forward_tasks(BufReader::new(tokio::io::stdin()), tasks));
    tokio::spawn(async move {
        if let Err(e) = stdio::emit_commands(commands, tokio::io::stdout()).await {
            tracing::error!(error = %e, "failed to write commands");
        }
    });

    tracing::info!("rflink-bridge ready");

    tokio::select! {
        () = bridge.run() => {
            tracing::error!("bridge loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    bridge.close().await;
    tracing::info!("rflink-bridge stopped");
    Ok(())
}
