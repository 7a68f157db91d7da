use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bistro_core::{DispatchError, DispatchResult, OrderIdGenerator, StatusNotifier};
use bistro_shared::{CustomerId, OrderId, OrderStatus, StaffId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::delivery::DeliveryCoordinator;
use crate::kitchen::KitchenCoordinator;
use crate::models::{format_cents, LineItem, OrderFactory, SharedOrder};
use crate::queue::{PriorityOrderQueue, LOWEST_PRIORITY};
use crate::registry::StaffAssignmentRegistry;
use crate::staff::{StaffMember, StaffRole, StaffWorker};
use crate::stats::{RestaurantStats, StatisticsSink};

/// Maps order size to a queue tier. Smaller orders are served first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityPolicy {
    /// Inclusive item-count ceilings for tiers 1 to 4; anything above the
    /// last one is tier 5.
    pub thresholds: [u32; 4],
}

impl PriorityPolicy {
    pub fn new(thresholds: [u32; 4]) -> DispatchResult<Self> {
        if thresholds.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(DispatchError::InvalidArgument(format!(
                "Priority thresholds must be ascending, got {:?}",
                thresholds
            )));
        }
        Ok(Self { thresholds })
    }

    pub fn tier_for(&self, item_count: u64) -> u8 {
        self.thresholds
            .iter()
            .position(|&limit| item_count <= u64::from(limit))
            .map(|index| index as u8 + 1)
            .unwrap_or(LOWEST_PRIORITY)
    }
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self {
            thresholds: [2, 4, 6, 8],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub order_id: OrderId,
    pub priority: u8,
    /// Cook the order was handed to, if one was free.
    pub chef: Option<StaffId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Assigned(StaffId),
    AwaitingCourier,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RestaurantStatus {
    pub is_open: bool,
    pub orders_in_queue: usize,
    pub total_chefs: usize,
    pub available_chefs: usize,
    pub total_couriers: usize,
    pub available_couriers: usize,
    pub awaiting_courier: usize,
    pub revenue_cents: i64,
    pub orders_processed: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyReport {
    pub restaurant: String,
    pub generated_at: DateTime<Utc>,
    pub orders_processed: u64,
    pub orders_delivered: u64,
    pub revenue_cents: i64,
    pub top_items: Vec<(String, u64)>,
}

/// Wires order intake to the kitchen queue, the cooks and the couriers.
pub struct RestaurantOrchestrator {
    name: String,
    address: String,
    policy: PriorityPolicy,
    factory: OrderFactory,
    queue: PriorityOrderQueue,
    registry: Arc<StaffAssignmentRegistry>,
    notifier: Arc<dyn StatusNotifier>,
    stats: Arc<dyn StatisticsSink>,
    chefs: RwLock<Vec<Arc<KitchenCoordinator>>>,
    couriers: RwLock<Vec<Arc<DeliveryCoordinator>>>,
    /// Which cook currently holds each order that has not left the kitchen.
    kitchen_routes: DashMap<OrderId, StaffId>,
    /// Every order ever submitted, kept for lookups after delivery.
    orders: DashMap<OrderId, SharedOrder>,
    completed: DashMap<OrderId, SharedOrder>,
    awaiting_courier: Mutex<VecDeque<SharedOrder>>,
    open: AtomicBool,
}

impl RestaurantOrchestrator {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        ids: Arc<OrderIdGenerator>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            policy: PriorityPolicy::default(),
            factory: OrderFactory::new(ids),
            queue: PriorityOrderQueue::new(),
            registry: Arc::new(StaffAssignmentRegistry::new()),
            notifier,
            stats: Arc::new(RestaurantStats::new()),
            chefs: RwLock::new(Vec::new()),
            couriers: RwLock::new(Vec::new()),
            kitchen_routes: DashMap::new(),
            orders: DashMap::new(),
            completed: DashMap::new(),
            awaiting_courier: Mutex::new(VecDeque::new()),
            open: AtomicBool::new(false),
        }
    }

    pub fn with_policy(mut self, policy: PriorityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatisticsSink>) -> Self {
        self.stats = stats;
        self
    }

    // ========== STAFF ==========

    pub fn add_chef(&self, member: StaffMember) -> DispatchResult<Arc<KitchenCoordinator>> {
        if member.role != StaffRole::Chef {
            return Err(DispatchError::InvalidArgument(format!("{} is not a chef", member)));
        }

        // Roster locks are always taken chefs first, then couriers.
        let mut chefs = self.chefs.write();
        let couriers = self.couriers.read();
        ensure_unique_id(&chefs, &couriers, member.id)?;

        info!(staff = %member.badge(), name = %member.name, "Chef joined the team");
        let chef = Arc::new(KitchenCoordinator::new(member, self.notifier.clone()));
        chefs.push(chef.clone());
        Ok(chef)
    }

    pub fn add_courier(&self, member: StaffMember) -> DispatchResult<Arc<DeliveryCoordinator>> {
        if member.role != StaffRole::Delivery {
            return Err(DispatchError::InvalidArgument(format!(
                "{} is not delivery staff",
                member
            )));
        }

        let chefs = self.chefs.read();
        let mut couriers = self.couriers.write();
        ensure_unique_id(&chefs, &couriers, member.id)?;

        info!(staff = %member.badge(), name = %member.name, "Courier joined the team");
        let courier = Arc::new(DeliveryCoordinator::new(
            member,
            self.registry.clone(),
            self.notifier.clone(),
        ));
        couriers.push(courier.clone());
        Ok(courier)
    }

    pub fn chef(&self, staff_id: StaffId) -> Option<Arc<KitchenCoordinator>> {
        self.chefs
            .read()
            .iter()
            .find(|chef| chef.member().id == staff_id)
            .cloned()
    }

    pub fn courier(&self, staff_id: StaffId) -> Option<Arc<DeliveryCoordinator>> {
        self.couriers
            .read()
            .iter()
            .find(|courier| courier.member().id == staff_id)
            .cloned()
    }

    pub fn chefs(&self) -> Vec<Arc<KitchenCoordinator>> {
        self.chefs.read().clone()
    }

    pub fn couriers(&self) -> Vec<Arc<DeliveryCoordinator>> {
        self.couriers.read().clone()
    }

    /// Everyone on shift, cooks first.
    pub fn staff_roster(&self) -> Vec<Arc<dyn StaffWorker>> {
        let mut roster: Vec<Arc<dyn StaffWorker>> = Vec::new();
        for chef in self.chefs.read().iter() {
            roster.push(chef.clone());
        }
        for courier in self.couriers.read().iter() {
            roster.push(courier.clone());
        }
        roster
    }

    pub fn find_staff(&self, staff_id: StaffId) -> Option<Arc<dyn StaffWorker>> {
        self.staff_roster()
            .into_iter()
            .find(|worker| worker.id() == staff_id)
    }

    // ========== OPENING HOURS ==========

    pub fn open(&self) -> DispatchResult<()> {
        if self.is_open() {
            return Err(DispatchError::InvalidArgument(
                "Restaurant is already open".to_string(),
            ));
        }
        if self.chefs.read().is_empty() {
            return Err(DispatchError::Staffing(
                "Cannot open without at least one chef".to_string(),
            ));
        }
        if self.couriers.read().is_empty() {
            return Err(DispatchError::Staffing(
                "Cannot open without at least one delivery staff".to_string(),
            ));
        }

        self.open.store(true, Ordering::SeqCst);
        info!(
            restaurant = %self.name,
            address = %self.address,
            chefs = self.chefs.read().len(),
            couriers = self.couriers.read().len(),
            "Restaurant is open"
        );
        Ok(())
    }

    pub fn close(&self) -> DailyReport {
        self.open.store(false, Ordering::SeqCst);
        let report = self.daily_report();
        info!(
            restaurant = %self.name,
            orders_processed = report.orders_processed,
            orders_delivered = report.orders_delivered,
            revenue = %format_cents(report.revenue_cents),
            "Restaurant is closed"
        );
        for (item, sold) in &report.top_items {
            info!(item = %item, sold, "Popular item");
        }
        report
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    // ========== ORDER FLOW ==========

    /// Builds an order with the injected id generator and submits it.
    pub fn place_order(
        &self,
        customer_id: impl Into<CustomerId>,
        items: Vec<LineItem>,
    ) -> DispatchResult<Submission> {
        self.ensure_open()?;
        let order = self.factory.create(customer_id, items)?;
        self.submit_order(order)
    }

    /// Queues a finalized order by size tier and hands it to the first idle
    /// cook, if any. Stats are recorded once the order is accepted.
    pub fn submit_order(&self, order: SharedOrder) -> DispatchResult<Submission> {
        self.ensure_open()?;

        let order_id = order.id();
        let status = order.status();
        if status != OrderStatus::Placed {
            return Err(DispatchError::invalid_transition(order_id, status, "submit"));
        }
        if self.orders.contains_key(&order_id) {
            return Err(DispatchError::InvalidArgument(format!(
                "Order #{} was already submitted",
                order_id
            )));
        }

        let priority = self.policy.tier_for(order.item_count());
        self.queue.insert(order.clone(), priority)?;
        self.orders.insert(order_id, order.clone());
        self.stats.record_order(&order);

        let chef = match self.first_idle_chef() {
            Some(chef) => {
                chef.receive_order(order)?;
                self.kitchen_routes.insert(order_id, chef.member().id);
                Some(chef.member().id)
            }
            None => {
                info!(order_id, "Order queued, all chefs busy");
                None
            }
        };

        info!(order_id, priority, ?chef, "Order submitted");
        Ok(Submission {
            order_id,
            priority,
            chef,
        })
    }

    /// Each idle cook takes the next placed order from the queue and starts
    /// preparing it. Returns the `(order, cook)` pairs that started.
    ///
    /// An order that cannot be started is logged and dropped from the queue;
    /// the cook moves on to the next one.
    pub fn process_kitchen_queue(&self) -> Vec<(OrderId, StaffId)> {
        let mut started = Vec::new();
        if !self.is_open() {
            return started;
        }

        for chef in self.chefs() {
            if chef.is_busy() {
                continue;
            }

            while let Some(order) = self.next_placed_order() {
                let order_id = order.id();
                let result = self
                    .route_to(&chef, order)
                    .and_then(|()| chef.start_preparing(order_id));

                match result {
                    Ok(()) => {
                        started.push((order_id, chef.member().id));
                        break;
                    }
                    Err(err) => {
                        warn!(order_id, staff = %chef.member().badge(), error = %err, "Could not start order");
                    }
                }
            }
        }
        started
    }

    /// Finishes preparation and tries to hand the order to a free courier.
    pub fn advance_to_delivery(&self, order_id: OrderId, chef_id: StaffId) -> DispatchResult<Handoff> {
        let chef = self
            .chef(chef_id)
            .ok_or_else(|| DispatchError::NotFound(format!("Chef not found: {}", chef_id)))?;

        chef.complete_order(order_id)?;
        self.kitchen_routes.remove(&order_id);

        let order = chef.order(order_id)?;
        self.dispatch(order)
    }

    /// Retries couriers for orders that were ready while everyone was out.
    pub fn dispatch_ready_orders(&self) -> Vec<(OrderId, StaffId)> {
        let mut waiting = self.awaiting_courier.lock();
        let mut assigned = Vec::new();
        let mut still_waiting = VecDeque::new();

        while let Some(order) = waiting.pop_front() {
            let order_id = order.id();
            if order.status() != OrderStatus::ReadyForDelivery {
                debug!(order_id, status = %order.status(), "Dropping stale dispatch entry");
                continue;
            }

            let Some(courier) = self.first_available_courier() else {
                still_waiting.push_back(order);
                continue;
            };

            match courier.assign_order(order.clone()) {
                Ok(()) => assigned.push((order_id, courier.member().id)),
                Err(DispatchError::AlreadyAssigned(_)) => {
                    debug!(order_id, "Order already claimed by another courier");
                }
                Err(err) => {
                    warn!(order_id, error = %err, "Dispatch attempt failed");
                    still_waiting.push_back(order);
                }
            }
        }

        *waiting = still_waiting;
        assigned
    }

    pub fn pickup_order(&self, order_id: OrderId, courier_id: StaffId) -> DispatchResult<()> {
        self.require_courier(courier_id)?.pickup_order(order_id)
    }

    pub fn deliver_order(&self, order_id: OrderId, courier_id: StaffId) -> DispatchResult<()> {
        let order = self.require_courier(courier_id)?.deliver_order(order_id)?;

        self.completed.insert(order_id, order);
        self.stats.record_delivery();
        info!(order_id, "Order successfully delivered");
        Ok(())
    }

    /// Cancels an order that has not started preparation, wherever it waits.
    pub fn cancel_order(&self, order_id: OrderId) -> DispatchResult<()> {
        let order = self.order(order_id)?;

        let owner = self.kitchen_routes.get(&order_id).map(|route| *route.value());
        match owner.and_then(|chef_id| self.chef(chef_id)) {
            Some(chef) => chef.cancel_order(order_id)?,
            None => order.cancel_unstarted()?,
        }
        self.kitchen_routes.remove(&order_id);

        match self.queue.remove_by_id(order_id) {
            Ok(_) | Err(DispatchError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    // ========== QUERIES ==========

    pub fn order(&self, order_id: OrderId) -> DispatchResult<SharedOrder> {
        self.orders
            .get(&order_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::order_not_found(order_id))
    }

    pub fn completed_orders(&self) -> Vec<SharedOrder> {
        let mut completed: Vec<SharedOrder> =
            self.completed.iter().map(|entry| entry.value().clone()).collect();
        completed.sort_by_key(|order| order.id());
        completed
    }

    pub fn awaiting_courier(&self) -> Vec<OrderId> {
        self.awaiting_courier.lock().iter().map(|order| order.id()).collect()
    }

    pub fn status(&self) -> RestaurantStatus {
        let chefs = self.chefs();
        let couriers = self.couriers();
        let snapshot = self.stats.snapshot();

        RestaurantStatus {
            is_open: self.is_open(),
            orders_in_queue: self.queue.len(),
            total_chefs: chefs.len(),
            available_chefs: chefs.iter().filter(|chef| !chef.is_busy()).count(),
            total_couriers: couriers.len(),
            available_couriers: couriers.iter().filter(|courier| !courier.is_busy()).count(),
            awaiting_courier: self.awaiting_courier.lock().len(),
            revenue_cents: snapshot.revenue_cents,
            orders_processed: snapshot.orders_processed,
        }
    }

    pub fn daily_report(&self) -> DailyReport {
        let snapshot = self.stats.snapshot();
        DailyReport {
            restaurant: self.name.clone(),
            generated_at: Utc::now(),
            orders_processed: snapshot.orders_processed,
            orders_delivered: snapshot.orders_delivered,
            revenue_cents: snapshot.revenue_cents,
            top_items: snapshot.top_items(3).to_vec(),
        }
    }

    pub fn queue(&self) -> &PriorityOrderQueue {
        &self.queue
    }

    pub fn registry(&self) -> &Arc<StaffAssignmentRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<dyn StatisticsSink> {
        &self.stats
    }

    pub fn policy(&self) -> &PriorityPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== HELPERS ==========

    fn ensure_open(&self) -> DispatchResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DispatchError::RestaurantClosed)
        }
    }

    fn first_idle_chef(&self) -> Option<Arc<KitchenCoordinator>> {
        self.chefs.read().iter().find(|chef| !chef.is_busy()).cloned()
    }

    fn first_available_courier(&self) -> Option<Arc<DeliveryCoordinator>> {
        self.couriers
            .read()
            .iter()
            .find(|courier| !courier.is_busy())
            .cloned()
    }

    fn require_courier(&self, courier_id: StaffId) -> DispatchResult<Arc<DeliveryCoordinator>> {
        self.courier(courier_id).ok_or_else(|| {
            DispatchError::NotFound(format!("Delivery staff not found: {}", courier_id))
        })
    }

    /// Pops queued orders until one is still waiting to be cooked. Orders a
    /// cook started directly are already in progress and are skipped.
    fn next_placed_order(&self) -> Option<SharedOrder> {
        while let Ok(order) = self.queue.dequeue() {
            if order.status() == OrderStatus::Placed {
                return Some(order);
            }
            debug!(order_id = order.id(), status = %order.status(), "Skipping order already in progress");
        }
        None
    }

    /// Makes sure `chef` holds the order, taking it from another cook if needed.
    fn route_to(&self, chef: &KitchenCoordinator, order: SharedOrder) -> DispatchResult<()> {
        let order_id = order.id();
        let chef_id = chef.member().id;
        let owner = self.kitchen_routes.get(&order_id).map(|route| *route.value());

        match owner {
            Some(owner_id) if owner_id == chef_id => {}
            Some(owner_id) => {
                if let Some(previous) = self.chef(owner_id) {
                    previous.hand_off(order_id)?;
                }
                chef.receive_order(order)?;
            }
            None => chef.receive_order(order)?,
        }

        self.kitchen_routes.insert(order_id, chef_id);
        Ok(())
    }

    fn dispatch(&self, order: SharedOrder) -> DispatchResult<Handoff> {
        let order_id = order.id();
        match self.first_available_courier() {
            Some(courier) => {
                courier.assign_order(order)?;
                info!(order_id, staff = %courier.member().badge(), "Order assigned to courier");
                Ok(Handoff::Assigned(courier.member().id))
            }
            None => {
                info!(order_id, "Order waiting for available delivery staff");
                self.awaiting_courier.lock().push_back(order);
                Ok(Handoff::AwaitingCourier)
            }
        }
    }
}

fn ensure_unique_id(
    chefs: &[Arc<KitchenCoordinator>],
    couriers: &[Arc<DeliveryCoordinator>],
    staff_id: StaffId,
) -> DispatchResult<()> {
    let taken = chefs.iter().any(|chef| chef.member().id == staff_id)
        || couriers.iter().any(|courier| courier.member().id == staff_id);
    if taken {
        return Err(DispatchError::InvalidArgument(format!(
            "Staff ID already exists: {}",
            staff_id
        )));
    }
    Ok(())
}
