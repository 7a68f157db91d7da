use std::sync::Arc;

use bistro_service::{build_restaurant, demo_orders, BroadcastNotifier, Config, ShiftWorker};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bistro_service=debug,bistro_order=info,bistro_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting {} at {}", config.restaurant.name, config.restaurant.address);

    // Status updates, as a customer-facing feed would see them
    let notifier = Arc::new(BroadcastNotifier::new(256));
    let mut updates = notifier.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(event) => tracing::info!(order_id = event.order_id, status = %event.status, "Customer notified"),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "Status feed fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let restaurant = build_restaurant(&config, notifier.clone())?;
    restaurant.open()?;

    for (customer, items) in demo_orders(&config)? {
        restaurant.place_order(customer, items)?;
    }
    tracing::info!("{}", restaurant.queue());

    let worker = ShiftWorker::new(restaurant.clone(), &config.worker);
    let ticks = worker.run().await;

    let report = restaurant.close();
    tracing::info!(ticks, report = %serde_json::to_string(&report)?, "Shift finished");

    listener.abort();
    Ok(())
}
