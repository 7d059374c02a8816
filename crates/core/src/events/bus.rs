use tokio::sync::broadcast;

use super::types::MigrationEvent;

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of pipeline progress. Slow subscribers lag and skip events; the
/// pipelines never wait on them.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MigrationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Returns how many subscribers received `event`, zero when nobody listens.
    pub fn publish(&self, event: MigrationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MigrationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
