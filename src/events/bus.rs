//! In-process event transport: tokio broadcast channels behind the
//! `publish`/`subscribe` contract. Delivery to live subscribers is
//! at-least-once from the consumer's perspective (workflows are
//! idempotent per run key); publishing with no subscribers is an error,
//! because the event would otherwise be silently lost.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use super::types::Event;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no subscribers for event {0}")]
    NoSubscribers(&'static str),
}

/// Receipt for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Number of subscribers the event was handed to.
    pub receivers: usize,
}

/// Shared reference to an [`EventBus`].
pub type SharedEventBus = Arc<EventBus>;

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    pub fn publish(&self, event: Event) -> Result<Ack, DispatchError> {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = name, receivers, "event published");
                Ok(Ack { receivers })
            }
            Err(_) => Err(DispatchError::NoSubscribers(name)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
