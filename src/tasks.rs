//! Background handling of utterances.
//!
//! A slow capability (weather over the network, a busy lighting bridge)
//! must not hold up unrelated commands. Each utterance is handled on its own
//! tokio task and the reply comes back through a channel.
//!
//! # Architecture
//!
//! 1. The input loop reads an utterance
//! 2. Instead of awaiting inline, it spawns a task via `TaskSpawner`
//! 3. The input loop keeps reading
//! 4. When the task completes, it sends an `AssistantMessage` through the channel
//! 5. The input loop receives it and prints the reply

use tokio::sync::mpsc;
use tracing::debug;

use crate::assistant::Assistant;
use crate::dispatch::Response;

/// Messages sent from background tasks to the input loop.
#[derive(Debug)]
pub enum AssistantMessage {
    /// A reply is ready.
    Responded {
        /// Sequence number assigned when the utterance was read.
        id: u64,
        utterance: String,
        response: Response,
    },
}

/// Spawns background tasks for utterances.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<AssistantMessage>,
}

impl TaskSpawner {
    /// Create a new TaskSpawner with the given channel sender.
    pub fn new(tx: mpsc::UnboundedSender<AssistantMessage>) -> Self {
        Self { tx }
    }

    /// Spawn a task that handles one utterance.
    pub fn spawn_handle(&self, assistant: &Assistant, id: u64, utterance: String) {
        let tx = self.tx.clone();
        let assistant = assistant.clone();
        tokio::spawn(async move {
            let response = assistant.handle(&utterance).await;
            debug!(id, kind = ?response.kind, "Utterance handled");
            let _ = tx.send(AssistantMessage::Responded {
                id,
                utterance,
                response,
            });
        });
    }
}

/// Create a new task channel and spawner.
///
/// Returns a tuple of (receiver, spawner). The receiver should be polled
/// in the input loop, and the spawner should be used to spawn tasks.
pub fn create_task_channel() -> (mpsc::UnboundedReceiver<AssistantMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx))
}
