use std::collections::BTreeMap;
use std::sync::Arc;

use bistro_core::{DispatchError, DispatchResult, StatusNotifier};
use bistro_shared::{OrderId, OrderStatus};
use parking_lot::Mutex;

use crate::models::SharedOrder;
use crate::staff::{KitchenWorker, StaffMember, StaffWorker};

#[derive(Debug, Default)]
struct KitchenBook {
    orders: BTreeMap<OrderId, SharedOrder>,
    active: BTreeMap<OrderId, SharedOrder>,
}

/// One cook's intake: every order received, and the ones on the stove.
pub struct KitchenCoordinator {
    member: StaffMember,
    notifier: Arc<dyn StatusNotifier>,
    book: Mutex<KitchenBook>,
}

impl KitchenCoordinator {
    pub fn new(member: StaffMember, notifier: Arc<dyn StatusNotifier>) -> Self {
        Self {
            member,
            notifier,
            book: Mutex::new(KitchenBook::default()),
        }
    }

    pub fn member(&self) -> &StaffMember {
        &self.member
    }

    pub fn receive_order(&self, order: SharedOrder) -> DispatchResult<()> {
        let order_id = order.id();
        self.book.lock().orders.insert(order_id, order);
        tracing::info!(order_id, staff = %self.member.badge(), "Chef received order");
        Ok(())
    }

    pub fn order(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        self.book
            .lock()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| DispatchError::order_not_found(order_id))
    }

    /// Placed -> Preparing, and the order becomes active.
    pub fn start_preparing(&self, order_id: OrderId) -> DispatchResult<()> {
        let mut book = self.book.lock();
        let order = lookup(&book.orders, order_id)?;

        order.advance(OrderStatus::Preparing, "start preparing", self.notifier.as_ref())?;
        book.active.insert(order_id, order);

        tracing::info!(order_id, staff = %self.member.badge(), "Chef started preparing order");
        Ok(())
    }

    /// Preparing -> ReadyForDelivery, and the order leaves the active set.
    pub fn complete_order(&self, order_id: OrderId) -> DispatchResult<()> {
        let mut book = self.book.lock();
        let order = lookup(&book.orders, order_id)?;

        order.advance(OrderStatus::ReadyForDelivery, "complete", self.notifier.as_ref())?;
        book.active.remove(&order_id);

        tracing::info!(order_id, staff = %self.member.badge(), "Order ready for delivery");
        Ok(())
    }

    /// Cancels an order that has not started preparation and forgets it.
    pub fn cancel_order(&self, order_id: OrderId) -> DispatchResult<()> {
        let mut book = self.book.lock();
        let order = lookup(&book.orders, order_id)?;

        order.cancel_unstarted()?;
        book.orders.remove(&order_id);

        tracing::info!(order_id, staff = %self.member.badge(), "Chef cancelled order");
        Ok(())
    }

    /// Gives up a still-Placed order so another cook can take it.
    pub fn hand_off(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        let mut book = self.book.lock();
        let order = lookup(&book.orders, order_id)?;

        let status = order.status();
        if status != OrderStatus::Placed {
            return Err(DispatchError::invalid_transition(order_id, status, "hand off"));
        }
        book.orders.remove(&order_id);
        Ok(order)
    }

    pub fn add_special_request(&self, order_id: OrderId, request: &str) -> DispatchResult<()> {
        self.order(order_id)?.add_special_request(request)
    }

    pub fn is_busy(&self) -> bool {
        !self.book.lock().active.is_empty()
    }

    pub fn all_orders(&self) -> Vec<SharedOrder> {
        self.book.lock().orders.values().cloned().collect()
    }

    pub fn active_orders(&self) -> Vec<SharedOrder> {
        self.book.lock().active.values().cloned().collect()
    }

    pub fn orders_with_status(&self, status: OrderStatus) -> Vec<SharedOrder> {
        self.book
            .lock()
            .orders
            .values()
            .filter(|order| order.status() == status)
            .cloned()
            .collect()
    }

    pub fn pending_orders(&self) -> Vec<SharedOrder> {
        self.orders_with_status(OrderStatus::Placed)
    }

    pub fn ready_orders(&self) -> Vec<SharedOrder> {
        self.orders_with_status(OrderStatus::ReadyForDelivery)
    }

    pub fn order_count(&self) -> usize {
        self.book.lock().orders.len()
    }

    pub fn active_order_count(&self) -> usize {
        self.book.lock().active.len()
    }
}

fn lookup(orders: &BTreeMap<OrderId, SharedOrder>, order_id: OrderId) -> DispatchResult<SharedOrder> {
    orders
        .get(&order_id)
        .cloned()
        .ok_or_else(|| DispatchError::order_not_found(order_id))
}

impl StaffWorker for KitchenCoordinator {
    fn member(&self) -> &StaffMember {
        &self.member
    }

    fn is_busy(&self) -> bool {
        KitchenCoordinator::is_busy(self)
    }
}

impl KitchenWorker for KitchenCoordinator {
    fn receive_order(&self, order: SharedOrder) -> DispatchResult<()> {
        KitchenCoordinator::receive_order(self, order)
    }

    fn start_preparing(&self, order_id: OrderId) -> DispatchResult<()> {
        KitchenCoordinator::start_preparing(self, order_id)
    }

    fn complete_order(&self, order_id: OrderId) -> DispatchResult<()> {
        KitchenCoordinator::complete_order(self, order_id)
    }

    fn cancel_order(&self, order_id: OrderId) -> DispatchResult<()> {
        KitchenCoordinator::cancel_order(self, order_id)
    }
}
