use std::sync::Arc;

use bistro_core::{DispatchError, DispatchResult, StatusNotifier};
use bistro_shared::{OrderId, OrderStatus};
use parking_lot::Mutex;

use crate::models::SharedOrder;
use crate::registry::StaffAssignmentRegistry;
use crate::staff::{DeliveryWorker, StaffMember, StaffWorker};

#[derive(Debug, Default)]
struct DeliveryBook {
    assigned: Vec<SharedOrder>,
    completed: Vec<SharedOrder>,
}

impl DeliveryBook {
    fn position_of(&self, order_id: OrderId) -> Option<usize> {
        self.assigned.iter().position(|order| order.id() == order_id)
    }
}

/// One courier's run sheet. Every claim goes through the shared registry.
pub struct DeliveryCoordinator {
    member: StaffMember,
    registry: Arc<StaffAssignmentRegistry>,
    notifier: Arc<dyn StatusNotifier>,
    book: Mutex<DeliveryBook>,
}

impl DeliveryCoordinator {
    pub fn new(
        member: StaffMember,
        registry: Arc<StaffAssignmentRegistry>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            member,
            registry,
            notifier,
            book: Mutex::new(DeliveryBook::default()),
        }
    }

    pub fn member(&self) -> &StaffMember {
        &self.member
    }

    /// Claims a ready order for this courier.
    pub fn assign_order(&self, order: SharedOrder) -> DispatchResult<()> {
        let order_id = order.id();
        let status = order.status();
        if status != OrderStatus::ReadyForDelivery {
            return Err(DispatchError::invalid_transition(
                order_id,
                status,
                "assign for delivery",
            ));
        }

        let mut book = self.book.lock();
        self.registry.try_assign(order_id)?;
        book.assigned.push(order);

        tracing::info!(order_id, staff = %self.member.badge(), "Courier assigned order");
        Ok(())
    }

    /// ReadyForDelivery -> OutForDelivery for an order this courier holds.
    pub fn pickup_order(&self, order_id: OrderId) -> DispatchResult<()> {
        let book = self.book.lock();
        let order = self.find_assigned(&book, order_id)?;

        order.advance(OrderStatus::OutForDelivery, "pickup", self.notifier.as_ref())?;

        tracing::info!(order_id, staff = %self.member.badge(), "Courier picked up order");
        Ok(())
    }

    /// OutForDelivery -> Delivered, then the claim is released.
    pub fn deliver_order(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        let mut book = self.book.lock();
        let order = self.find_assigned(&book, order_id)?;

        order.advance(OrderStatus::Delivered, "deliver", self.notifier.as_ref())?;
        if let Some(position) = book.position_of(order_id) {
            book.assigned.remove(position);
        }
        book.completed.push(order.clone());
        self.registry.release(order_id);

        tracing::info!(
            order_id,
            staff = %self.member.badge(),
            customer = order.customer_id(),
            "Courier delivered order"
        );
        Ok(order)
    }

    /// Busy only while something is on the road; assigned-but-waiting orders
    /// do not count.
    pub fn is_busy(&self) -> bool {
        self.book
            .lock()
            .assigned
            .iter()
            .any(|order| order.status() == OrderStatus::OutForDelivery)
    }

    pub fn assigned_orders(&self) -> Vec<SharedOrder> {
        self.book.lock().assigned.clone()
    }

    pub fn delivered_orders(&self) -> Vec<SharedOrder> {
        self.book.lock().completed.clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.book.lock().completed.len()
    }

    pub fn orders_out_for_delivery(&self) -> Vec<SharedOrder> {
        self.assigned_with_status(OrderStatus::OutForDelivery)
    }

    pub fn orders_ready_for_pickup(&self) -> Vec<SharedOrder> {
        self.assigned_with_status(OrderStatus::ReadyForDelivery)
    }

    fn assigned_with_status(&self, status: OrderStatus) -> Vec<SharedOrder> {
        self.book
            .lock()
            .assigned
            .iter()
            .filter(|order| order.status() == status)
            .cloned()
            .collect()
    }

    fn find_assigned(&self, book: &DeliveryBook, order_id: OrderId) -> DispatchResult<SharedOrder> {
        book.position_of(order_id)
            .map(|position| book.assigned[position].clone())
            .ok_or_else(|| {
                DispatchError::NotFound(format!(
                    "Order #{} not assigned to {}",
                    order_id, self.member
                ))
            })
    }
}

impl StaffWorker for DeliveryCoordinator {
    fn member(&self) -> &StaffMember {
        &self.member
    }

    fn is_busy(&self) -> bool {
        DeliveryCoordinator::is_busy(self)
    }
}

impl DeliveryWorker for DeliveryCoordinator {
    fn assign_order(&self, order: SharedOrder) -> DispatchResult<()> {
        DeliveryCoordinator::assign_order(self, order)
    }

    fn pickup_order(&self, order_id: OrderId) -> DispatchResult<()> {
        DeliveryCoordinator::pickup_order(self, order_id)
    }

    fn deliver_order(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        DeliveryCoordinator::deliver_order(self, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, MenuItemRef, OrderRecord};
    use bistro_core::InMemoryNotifier;

    struct Fixture {
        registry: Arc<StaffAssignmentRegistry>,
        notifier: Arc<InMemoryNotifier>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Arc::new(StaffAssignmentRegistry::new()),
                notifier: Arc::new(InMemoryNotifier::new()),
            }
        }

        fn courier(&self, id: u64) -> DeliveryCoordinator {
            DeliveryCoordinator::new(
                StaffMember::courier(id, format!("Courier {}", id)).unwrap(),
                self.registry.clone(),
                self.notifier.clone(),
            )
        }

        fn ready_order(&self, id: u64) -> SharedOrder {
            let items = vec![LineItem::new(MenuItemRef::new(3, "Potato Soup"), 1, 650)];
            let order = Arc::new(OrderRecord::new(id, "cust", items, chrono::Utc::now()).unwrap());
            order.advance(OrderStatus::Preparing, "start", self.notifier.as_ref()).unwrap();
            order.advance(OrderStatus::ReadyForDelivery, "complete", self.notifier.as_ref()).unwrap();
            order
        }
    }

    #[test]
    fn test_delivery_lifecycle_releases_claim() {
        let fx = Fixture::new();
        let courier = fx.courier(1);
        let order = fx.ready_order(10);

        courier.assign_order(order.clone()).unwrap();
        assert!(fx.registry.is_assigned(10));
        assert!(!courier.is_busy());
        assert_eq!(courier.orders_ready_for_pickup().len(), 1);

        courier.pickup_order(10).unwrap();
        assert!(courier.is_busy());
        assert_eq!(courier.orders_out_for_delivery().len(), 1);

        courier.deliver_order(10).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(!fx.registry.is_assigned(10));
        assert!(courier.assigned_orders().is_empty());
        assert_eq!(courier.delivered_count(), 1);
        assert!(!courier.is_busy());
    }

    #[test]
    fn test_second_courier_cannot_claim_same_order() {
        let fx = Fixture::new();
        let first = fx.courier(1);
        let second = fx.courier(2);
        let order = fx.ready_order(10);

        first.assign_order(order.clone()).unwrap();
        let result = second.assign_order(order);

        assert_eq!(result, Err(DispatchError::AlreadyAssigned(10)));
        assert!(second.assigned_orders().is_empty());
    }

    #[test]
    fn test_assign_requires_ready_status() {
        let fx = Fixture::new();
        let courier = fx.courier(1);
        let items = vec![LineItem::new(MenuItemRef::new(3, "Potato Soup"), 1, 650)];
        let order = Arc::new(OrderRecord::new(4, "cust", items, chrono::Utc::now()).unwrap());

        assert!(matches!(
            courier.assign_order(order),
            Err(DispatchError::InvalidStateTransition { from: OrderStatus::Placed, .. })
        ));
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn test_pickup_of_unassigned_order_is_not_found() {
        let fx = Fixture::new();
        let courier = fx.courier(1);

        assert!(matches!(courier.pickup_order(99), Err(DispatchError::NotFound(_))));
    }

    #[test]
    fn test_deliver_before_pickup_is_rejected() {
        let fx = Fixture::new();
        let courier = fx.courier(1);
        courier.assign_order(fx.ready_order(10)).unwrap();

        assert!(matches!(
            courier.deliver_order(10),
            Err(DispatchError::InvalidStateTransition { .. })
        ));
        assert!(fx.registry.is_assigned(10));
        assert_eq!(courier.assigned_orders().len(), 1);
    }
}
