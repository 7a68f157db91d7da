use std::sync::Arc;

use bistro_core::DispatchResult;
use bistro_order::{Handoff, RestaurantOrchestrator};
use serde::Serialize;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::app_config::WorkerConfig;

/// What moved during one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub delivered: usize,
    pub picked_up: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub started: usize,
}

impl TickSummary {
    pub fn is_idle(&self) -> bool {
        *self == TickSummary::default()
    }
}

/// Plays the staff: every tick each order in flight moves one step.
pub struct ShiftWorker {
    restaurant: Arc<RestaurantOrchestrator>,
    period: Duration,
    max_ticks: u32,
}

impl ShiftWorker {
    pub fn new(restaurant: Arc<RestaurantOrchestrator>, config: &WorkerConfig) -> Self {
        Self {
            restaurant,
            period: Duration::from_millis(config.tick_ms.max(1)),
            max_ticks: config.max_ticks,
        }
    }

    /// Steps run from the end of the pipeline backwards so no order moves
    /// twice in one tick.
    pub fn tick(&self) -> DispatchResult<TickSummary> {
        let mut summary = TickSummary::default();
        let couriers = self.restaurant.couriers();

        for courier in &couriers {
            for order in courier.orders_out_for_delivery() {
                self.restaurant.deliver_order(order.id(), courier.member().id)?;
                summary.delivered += 1;
            }
        }

        for courier in &couriers {
            for order in courier.orders_ready_for_pickup() {
                self.restaurant.pickup_order(order.id(), courier.member().id)?;
                summary.picked_up += 1;
            }
        }

        summary.dispatched += self.restaurant.dispatch_ready_orders().len();

        for chef in self.restaurant.chefs() {
            for order in chef.active_orders() {
                let handoff = self.restaurant.advance_to_delivery(order.id(), chef.member().id)?;
                if let Handoff::Assigned(_) = handoff {
                    summary.dispatched += 1;
                }
                summary.completed += 1;
            }
        }

        summary.started = self.restaurant.process_kitchen_queue().len();
        Ok(summary)
    }

    /// Ticks until nothing moves or `max_ticks` is reached. Returns the
    /// number of ticks run.
    pub async fn run(&self) -> u32 {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            restaurant = self.restaurant.name(),
            period_ms = self.period.as_millis() as u64,
            max_ticks = self.max_ticks,
            "Shift worker started"
        );

        let mut ticks = 0;
        while ticks < self.max_ticks {
            timer.tick().await;
            ticks += 1;

            match self.tick() {
                Ok(summary) if summary.is_idle() => {
                    info!(ticks, "Nothing left to move, shift worker stopping");
                    break;
                }
                Ok(summary) => debug!(tick = ticks, ?summary, "Shift tick"),
                Err(e) => error!("Shift tick failed: {}", e),
            }
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::{InMemoryNotifier, OrderIdGenerator};
    use bistro_order::{LineItem, MenuItemRef, StaffMember};
    use bistro_shared::OrderStatus;

    fn restaurant() -> Arc<RestaurantOrchestrator> {
        let restaurant = RestaurantOrchestrator::new(
            "Spud Shack",
            "1 Tater Lane",
            Arc::new(OrderIdGenerator::new()),
            Arc::new(InMemoryNotifier::new()),
        );
        restaurant.add_chef(StaffMember::chef(1, "Remy").unwrap()).unwrap();
        restaurant.add_courier(StaffMember::courier(2, "Dana").unwrap()).unwrap();
        restaurant.open().unwrap();
        Arc::new(restaurant)
    }

    #[test]
    fn test_each_tick_moves_an_order_one_step() {
        let restaurant = restaurant();
        let worker = ShiftWorker::new(restaurant.clone(), &WorkerConfig::default());
        let order_id = restaurant
            .place_order("c", vec![LineItem::new(MenuItemRef::new(1, "Fries"), 1, 300)])
            .unwrap()
            .order_id;
        let status = || restaurant.order(order_id).unwrap().status();

        assert_eq!(worker.tick().unwrap().started, 1);
        assert_eq!(status(), OrderStatus::Preparing);

        let summary = worker.tick().unwrap();
        assert_eq!((summary.completed, summary.dispatched), (1, 1));
        assert_eq!(status(), OrderStatus::ReadyForDelivery);

        assert_eq!(worker.tick().unwrap().picked_up, 1);
        assert_eq!(status(), OrderStatus::OutForDelivery);

        assert_eq!(worker.tick().unwrap().delivered, 1);
        assert_eq!(status(), OrderStatus::Delivered);

        assert!(worker.tick().unwrap().is_idle());
    }

    #[tokio::test]
    async fn test_run_stops_when_idle() {
        let restaurant = restaurant();
        let config = WorkerConfig {
            tick_ms: 1,
            max_ticks: 50,
        };
        let worker = ShiftWorker::new(restaurant.clone(), &config);

        assert_eq!(worker.run().await, 1);
    }
}
