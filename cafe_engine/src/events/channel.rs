//! In-process fan-out of row changes to realtime subscribers.
//!
//! Every subscriber gets its own receiver on a tokio broadcast channel. Publishing never blocks; a subscriber that
//! falls more than the buffer size behind loses the oldest events and is told to resync.
use log::*;
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

use super::RealtimeEvent;

pub const DEFAULT_BUFFER_SIZE: usize = 256;

#[derive(Clone)]
pub struct RealtimeHub {
    sender: Sender<RealtimeEvent>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl RealtimeHub {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<RealtimeEvent> {
        debug!("📬️ New realtime subscriber. {} active", self.sender.receiver_count() + 1);
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes the event to every current subscriber. Having nobody listening is not an error.
    pub fn publish_event(&self, event: RealtimeEvent) {
        let name = event.event_name();
        match self.sender.send(event) {
            Ok(n) => trace!("📬️ {name} event sent to {n} subscribers"),
            Err(_) => trace!("📬️ No subscribers for {name} event"),
        }
    }

    /// Waits for the next event. A lagging receiver gets a [`RealtimeEvent::Resync`] in place of the events it
    /// missed. Returns `None` once the hub has been dropped.
    pub async fn next_event(receiver: &mut Receiver<RealtimeEvent>) -> Option<RealtimeEvent> {
        match receiver.recv().await {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(missed)) => {
                warn!("📬️ Realtime subscriber lagged behind by {missed} events");
                Some(RealtimeEvent::Resync { missed })
            },
            Err(RecvError::Closed) => None,
        }
    }
}
