use bistro_core::StatusNotifier;
use bistro_shared::{OrderId, OrderStatus, OrderStatusChangedEvent};
use tokio::sync::broadcast;

/// Fans status changes out to any number of subscribers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<OrderStatusChangedEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderStatusChangedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl StatusNotifier for BroadcastNotifier {
    fn notify(&self, order_id: OrderId, status: OrderStatus) {
        let event = OrderStatusChangedEvent::new(order_id, status);
        // No subscribers is not an error
        if self.tx.send(event).is_err() {
            tracing::debug!(order_id, %status, "No listeners for status change");
        }
    }
}
