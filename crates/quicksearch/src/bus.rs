use tokio::sync::broadcast;

use crate::model::ListEvent;

/// Notifications for index consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    /// The ordered list changed.
    List(ListEvent),
    /// The entry count changed to the given value.
    LengthChanged(usize),
    /// Something failed without affecting the index, e.g. a launch.
    Warning(String),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<IndexEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers reached. Publishing with nobody
    /// subscribed is not an error for the index.
    pub fn publish(&self, event: IndexEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
