//! JSON-lines adapter standing in for the rest of the gateway.
//!
//! One `Task` per input line goes onto the outbound queue; every inbound
//! `Command` is written as one line of JSON.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use rflink_protocol::{Command, Task};

/// Read tasks from `reader` until EOF or until the queue closes.
/// Malformed lines are logged and skipped.
pub async fn forward_tasks<R>(reader: R, tasks: UnboundedSender<Task>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number = 0usize;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("task input closed");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read task input");
                return;
            }
        };
        line_number += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Task>(trimmed) {
            Ok(task) => {
                if tasks.send(task).is_err() {
                    tracing::warn!("outbound queue closed, stopping task input");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "skipping malformed task");
            }
        }
    }
}

/// Write every command from the inbound queue to `writer`, one JSON object
/// per line, until the queue closes.
pub async fn emit_commands<W>(
    mut commands: UnboundedReceiver<Command>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        let mut line = serde_json::to_vec(&command)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rflink_protocol::topics::ParsedTopic;
    use rflink_protocol::{Method, Payload};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn forwards_valid_lines_and_skips_garbage() {
        let input = concat!(
            r#"{"method":"publish","topic":"Oregon/2a19/R/TEMP","payload":23.5}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"method":"publish","topic":"NewKaku/00c2/R/CMD","payload":"ON"}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        forward_tasks(input.as_bytes(), tx).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.topic, "Oregon/2a19/R/TEMP");
        assert!(first.payload.is_number());
        let second = rx.recv().await.unwrap();
        assert_eq!(second.method, Method::Publish);
        assert_eq!(second.payload, Payload::from("ON"));
        // Sender dropped once input is exhausted.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_when_queue_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let input = r#"{"method":"publish","topic":"a","payload":"1"}"#;
        forward_tasks(input.as_bytes(), tx).await;
    }

    #[tokio::test]
    async fn emits_one_line_per_command() {
        let (tx, rx) = mpsc::unbounded_channel();
        for payload in ["ON", "OFF"] {
            let parsed = ParsedTopic {
                family: "NewKaku".into(),
                device_id: "00c2".into(),
                param: "CMD".into(),
            };
            tx.send(Command::new("rflink/NewKaku/00c2/W/CMD", parsed, payload))
                .unwrap();
        }
        drop(tx);

        let mut out = Vec::new();
        emit_commands(rx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["deviceId"], "00c2");
        assert_eq!(first["payload"], "ON");
        assert_eq!(first["qos"], 1);
    }
}
