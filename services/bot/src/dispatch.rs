//! services/bot/src/dispatch.rs
//!
//! Routes incoming chat messages through the conversation and sends the
//! replies back. Every message is handled in its own task so one slow search
//! never holds up other chats.

use book_finder_core::domain::IncomingMessage;
use book_finder_core::ports::ChatTransport;
use book_finder_core::Conversation;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Clones share one task tracker, so `drain` on any clone waits for handlers
/// spawned through all of them.
#[derive(Clone)]
pub struct Dispatcher {
    conversation: Arc<Conversation>,
    transport: Arc<dyn ChatTransport>,
    in_flight: TaskTracker,
}

impl Dispatcher {
    pub fn new(conversation: Arc<Conversation>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            conversation,
            transport,
            in_flight: TaskTracker::new(),
        }
    }

    /// Handles one message to completion, including delivery of the reply.
    pub async fn handle_message(&self, message: IncomingMessage) {
        let Some(reply) = self.conversation.handle(&message).await else {
            return;
        };
        if let Err(e) = self.transport.send_reply(message.chat_id, &reply).await {
            warn!(chat_id = message.chat_id, "Failed to deliver reply: {}", e);
        }
    }

    /// Handles one message on a new tracked task.
    pub fn spawn(&self, message: IncomingMessage) -> JoinHandle<()> {
        let dispatcher = self.clone();
        self.in_flight
            .spawn(async move { dispatcher.handle_message(message).await })
    }

    /// Waits until every handler spawned so far has finished.
    pub async fn drain(&self) {
        self.in_flight.close();
        info!("Waiting for {} in-flight messages...", self.in_flight.len());
        self.in_flight.wait().await;
    }

    /// Drives a message stream until it ends, then waits for in-flight handlers.
    pub async fn run<S>(&self, messages: S)
    where
        S: Stream<Item = IncomingMessage>,
    {
        futures::pin_mut!(messages);
        while let Some(message) = messages.next().await {
            self.spawn(message);
        }
        self.drain().await;
    }
}
