use log::debug;
use tokio::sync::broadcast;

use super::DomainEvent;

/// Fire-and-forget receiver of domain events. Implementations must not block
/// and must tolerate concurrent callers.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Sink that fans events out to any number of in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl DomainEventSink for BroadcastEventSink {
    fn emit(&self, event: DomainEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            debug!("[DomainEvent] No subscribers for {}", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SyncCompletedEvent;
    use crate::sync::SyncType;

    fn event() -> DomainEvent {
        DomainEvent::transactions_synced(SyncCompletedEvent {
            connection_id: "conn-1".to_string(),
            user_id: "user-1".to_string(),
            transaction_ids: Vec::new(),
            sync_type: SyncType::Incremental,
            transactions_inserted: 0,
            duplicates_skipped: 3,
        })
    }

    #[tokio::test]
    async fn broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastEventSink::new(8);
        let mut receiver = sink.subscribe();
        sink.emit(event());
        let received = receiver.recv().await.expect("receive event");
        let payload = received.as_transactions_synced().expect("sync payload");
        assert_eq!(payload.duplicates_skipped, 3);
    }

    #[test]
    fn broadcast_sink_without_subscribers_does_not_fail() {
        BroadcastEventSink::new(1).emit(event());
        NoOpDomainEventSink.emit(event());
    }
}
