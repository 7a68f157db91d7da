use uuid::Uuid;

use crate::status::OrderStatus;
use crate::OrderId;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OrderStatusChangedEvent {
    pub event_id: Uuid,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub timestamp: i64,
}

impl OrderStatusChangedEvent {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            order_id,
            status,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}
