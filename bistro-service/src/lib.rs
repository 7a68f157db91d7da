use std::sync::Arc;

use bistro_core::{OrderIdGenerator, StatusNotifier};
use bistro_order::{LineItem, MenuItemRef, PriorityPolicy, RestaurantOrchestrator, StaffMember};
use bistro_shared::CustomerId;

pub mod app_config;
pub mod error;
pub mod notify;
pub mod worker;

pub use app_config::Config;
pub use error::ServiceError;
pub use notify::BroadcastNotifier;
pub use worker::{ShiftWorker, TickSummary};

/// Builds the restaurant and its roster from configuration. The restaurant
/// is left closed.
pub fn build_restaurant(
    config: &Config,
    notifier: Arc<dyn StatusNotifier>,
) -> Result<Arc<RestaurantOrchestrator>, ServiceError> {
    let policy = PriorityPolicy::new(config.priority.thresholds)?;
    let restaurant = RestaurantOrchestrator::new(
        config.restaurant.name.clone(),
        config.restaurant.address.clone(),
        Arc::new(OrderIdGenerator::new()),
        notifier,
    )
    .with_policy(policy);

    for chef in &config.staff.chefs {
        restaurant.add_chef(StaffMember::chef(chef.id, chef.name.clone())?)?;
    }
    for courier in &config.staff.couriers {
        restaurant.add_courier(StaffMember::courier(courier.id, courier.name.clone())?)?;
    }

    Ok(Arc::new(restaurant))
}

/// Deterministic sample orders cycling through the menu. Order `n` carries
/// up to three distinct dishes, so the batch spans several priority tiers.
pub fn demo_orders(config: &Config) -> Result<Vec<(CustomerId, Vec<LineItem>)>, ServiceError> {
    if config.menu.is_empty() {
        return Err(ServiceError::EmptyMenu);
    }

    let menu = &config.menu;
    let orders = (0..config.demo.orders)
        .map(|n| {
            let dishes = ((n % 3) + 1).min(menu.len());
            let items = (0..dishes)
                .map(|offset| {
                    let entry = &menu[(n + offset) % menu.len()];
                    let quantity = 1 + (n % 2) as u32;
                    LineItem::new(MenuItemRef::new(entry.id, entry.name.clone()), quantity, entry.price_cents)
                })
                .collect();
            (format!("customer-{:03}", n + 1), items)
        })
        .collect();
    Ok(orders)
}
