use std::sync::Arc;

use bistro_service::{build_restaurant, demo_orders, BroadcastNotifier, Config, ServiceError, ShiftWorker};
use bistro_shared::OrderStatus;

const CONFIG: &str = r#"
[restaurant]
name = "Spud Shack"
address = "12 Market Street"

[staff]
chefs = [{ id = 1, name = "Remy" }, { id = 2, name = "Colette" }]
couriers = [{ id = 11, name = "Dana" }]

[worker]
tick_ms = 1
max_ticks = 100

[[menu]]
id = 1
name = "Loaded Fries"
price_cents = 399

[[menu]]
id = 2
name = "Baked Potato"
price_cents = 499

[demo]
orders = 4
"#;

#[tokio::test]
async fn test_demo_shift_delivers_every_order() {
    let config = Config::from_toml(CONFIG).unwrap();
    let notifier = Arc::new(BroadcastNotifier::new(64));
    let mut updates = notifier.subscribe();

    let restaurant = build_restaurant(&config, notifier.clone()).unwrap();
    restaurant.open().unwrap();

    let orders = demo_orders(&config).unwrap();
    let expected_revenue: i64 = orders
        .iter()
        .flat_map(|(_, items)| items.iter())
        .map(|item| item.subtotal_cents())
        .sum();
    for (customer, items) in orders {
        restaurant.place_order(customer, items).unwrap();
    }

    let worker = ShiftWorker::new(restaurant.clone(), &config.worker);
    let ticks = worker.run().await;
    assert!(ticks < config.worker.max_ticks);

    let report = restaurant.close();
    assert_eq!(report.orders_processed, 4);
    assert_eq!(report.orders_delivered, 4);
    assert_eq!(report.revenue_cents, expected_revenue);
    assert!(restaurant.registry().is_empty());

    let mut delivered = 0;
    let mut events = 0;
    while let Ok(event) = updates.try_recv() {
        events += 1;
        if event.status == OrderStatus::Delivered {
            delivered += 1;
        }
    }
    assert_eq!(events, 16);
    assert_eq!(delivered, 4);
}

#[test]
fn test_duplicate_staff_in_config_is_rejected() {
    let config = Config::from_toml(&CONFIG.replace("id = 11", "id = 2")).unwrap();
    let result = build_restaurant(&config, Arc::new(BroadcastNotifier::new(4)));

    assert!(matches!(result, Err(ServiceError::Dispatch(_))));
}

#[test]
fn test_demo_orders_need_a_menu() {
    let mut config = Config::from_toml(CONFIG).unwrap();
    config.menu.clear();

    assert!(matches!(demo_orders(&config), Err(ServiceError::EmptyMenu)));
}
