//! The queue pair connecting the bridge to the rest of the gateway.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use rflink_protocol::{Command, Task};

/// Gateway-side ends: feed tasks in, read commands out.
pub struct GatewayHandle {
    pub tasks: UnboundedSender<Task>,
    pub commands: UnboundedReceiver<Command>,
}

/// Bridge-side ends. Holds its own sender on the outbound queue so failed
/// tasks can be put back.
pub struct BridgeQueues {
    outbound: UnboundedReceiver<Task>,
    requeue: UnboundedSender<Task>,
    inbound: UnboundedSender<Command>,
}

/// Create a connected queue pair.
pub fn queue_pair() -> (GatewayHandle, BridgeQueues) {
    let (task_tx, task_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let handle = GatewayHandle {
        tasks: task_tx.clone(),
        commands: command_rx,
    };
    let queues = BridgeQueues {
        outbound: task_rx,
        requeue: task_tx,
        inbound: command_tx,
    };
    (handle, queues)
}

impl BridgeQueues {
    /// Pop the next outbound task without waiting.
    pub fn try_next(&mut self) -> Option<Task> {
        self.outbound.try_recv().ok()
    }

    /// Put a task back at the tail of the outbound queue.
    pub fn requeue(&self, task: Task) {
        // Cannot fail while `self.outbound` is alive.
        if let Err(e) = self.requeue.send(task) {
            tracing::error!(topic = %e.0.topic, "outbound queue closed, task lost");
        }
    }

    /// Hand a command to the gateway. Returns false if nobody is listening.
    pub fn deliver(&self, command: Command) -> bool {
        self.inbound.send(command).is_ok()
    }
}
