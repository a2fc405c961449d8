use tokio::sync::broadcast;
use tracing::debug;

use crate::models::ChatEvent;

/// Fan-out of chat events to every connected client.
///
/// Subscribers only see events published after they subscribed; history is
/// served from storage instead.
#[derive(Debug, Clone)]
pub struct ChatHub {
    tx: broadcast::Sender<ChatEvent>,
}

impl ChatHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers the event reached. Nobody listening is fine.
    pub fn publish(&self, event: ChatEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Chat event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
