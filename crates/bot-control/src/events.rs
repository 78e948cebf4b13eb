use tokio::sync::broadcast;
use tracing::trace;

use bot_proto::ConsoleEvent;

/// Fan-out of console events to every subscribed surface. Emitting never
/// blocks; slow subscribers lag and lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn emit(&self, ev: ConsoleEvent) {
        trace!(?ev, "event");
        // no subscribers is fine
        let _ = self.tx.send(ev);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<ConsoleEvent> {
        self.tx.clone()
    }
}
