use bistro_shared::{OrderId, OrderStatus, OrderStatusChangedEvent};
use parking_lot::Mutex;

/// Receives one call per successful status transition.
///
/// Implementations must not fail the caller; the transition has already
/// been committed when `notify` runs.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, order_id: OrderId, status: OrderStatus);
}

/// Writes every status change to the tracing log.
pub struct TracingNotifier;

impl StatusNotifier for TracingNotifier {
    fn notify(&self, order_id: OrderId, status: OrderStatus) {
        let event = OrderStatusChangedEvent::new(order_id, status);
        tracing::info!(order_id, %status, payload = %event.to_json(), "Order status changed");
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Default)]
pub struct InMemoryNotifier {
    events: Mutex<Vec<OrderStatusChangedEvent>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OrderStatusChangedEvent> {
        self.events.lock().clone()
    }

    /// Statuses reported for one order, oldest first.
    pub fn history(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.order_id == order_id)
            .map(|e| e.status)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl StatusNotifier for InMemoryNotifier {
    fn notify(&self, order_id: OrderId, status: OrderStatus) {
        self.events.lock().push(OrderStatusChangedEvent::new(order_id, status));
    }
}
