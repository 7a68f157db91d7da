use bistro_core::{DispatchError, DispatchResult};
use bistro_shared::OrderId;
use dashmap::DashSet;

/// Orders currently held by a delivery worker.
///
/// Membership is the only record of "already dispatched". The set is never
/// handed out for iteration; callers get `try_assign`, `release` and point
/// queries only.
#[derive(Debug, Default)]
pub struct StaffAssignmentRegistry {
    assigned: DashSet<OrderId>,
}

impl StaffAssignmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the order. The check and the insert happen under one shard lock.
    pub fn try_assign(&self, order_id: OrderId) -> DispatchResult<()> {
        if self.assigned.insert(order_id) {
            tracing::debug!(order_id, "Order claimed for delivery");
            Ok(())
        } else {
            Err(DispatchError::AlreadyAssigned(order_id))
        }
    }

    /// Drops the claim. Releasing an unclaimed order is a no-op.
    pub fn release(&self, order_id: OrderId) {
        if self.assigned.remove(&order_id).is_some() {
            tracing::debug!(order_id, "Order claim released");
        }
    }

    pub fn is_assigned(&self, order_id: OrderId) -> bool {
        self.assigned.contains(&order_id)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
