//! Event bus - pub/sub for run and task lifecycle events
//!
//! Built on tokio broadcast channels. Components emit events; consumers
//! (CLI output, loggers) subscribe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::PfEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Central event bus for pipeline and task activity
///
/// Event publication is fire-and-forget: an emitter never learns whether a
/// subscriber saw the event, and a slow subscriber never stalls the
/// pipeline.
pub struct EventBus {
    tx: broadcast::Sender<PfEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no subscribers the event is dropped. If the channel is
    /// full, oldest events are dropped.
    pub fn emit(&self, event: PfEvent) {
        debug!(
            event_type = event.event_type(),
            subject_id = event.subject_id(),
            "EventBus::emit"
        );
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PfEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_event_bus_creation() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new(16);
        let _rx1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(PfEvent::RunGenerated { run_id: "run-123".to_string() });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.subject_id(), "run-123");
        assert_eq!(event.event_type(), "run_generated");
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers() {
        let bus = EventBus::new(16);
        // Must not panic or error with no subscribers
        bus.emit(PfEvent::RunGenerated { run_id: "run-123".to_string() });
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(PfEvent::TaskStarted {
            task_id: "t1".to_string(),
            target: "tier1/segment0".to_string(),
            estimated_seconds: 60,
        });

        assert_eq!(rx1.recv().await.unwrap().subject_id(), "t1");
        assert_eq!(rx2.recv().await.unwrap().subject_id(), "t1");

        assert!(matches!(rx1.try_recv(), Err(TryRecvError::Empty)));
    }
}
