use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::models::OrderRecord;

/// Aggregate counters fed by the orchestrator.
///
/// Recording must never block or fail the operation that triggered it.
pub trait StatisticsSink: Send + Sync {
    fn record_order(&self, order: &OrderRecord);
    fn record_delivery(&self);
    fn snapshot(&self) -> StatsSnapshot;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub orders_processed: u64,
    pub orders_delivered: u64,
    pub revenue_cents: i64,
    /// Units sold per menu item, best sellers first.
    pub popular_items: Vec<(String, u64)>,
    pub started_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn top_items(&self, n: usize) -> &[(String, u64)] {
        &self.popular_items[..n.min(self.popular_items.len())]
    }
}

/// Lock-free restaurant counters.
pub struct RestaurantStats {
    orders_processed: AtomicU64,
    orders_delivered: AtomicU64,
    revenue_cents: AtomicI64,
    popular_items: DashMap<String, u64>,
    started_at: DateTime<Utc>,
}

impl RestaurantStats {
    pub fn new() -> Self {
        Self {
            orders_processed: AtomicU64::new(0),
            orders_delivered: AtomicU64::new(0),
            revenue_cents: AtomicI64::new(0),
            popular_items: DashMap::new(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RestaurantStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsSink for RestaurantStats {
    fn record_order(&self, order: &OrderRecord) {
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
        self.revenue_cents.fetch_add(order.total_cents(), Ordering::Relaxed);

        for line in order.items() {
            *self.popular_items.entry(line.item.name.clone()).or_insert(0) +=
                u64::from(line.quantity);
        }
    }

    fn record_delivery(&self) {
        self.orders_delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut popular_items: Vec<(String, u64)> = self
            .popular_items
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        // Ties broken by name so reports are stable.
        popular_items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        StatsSnapshot {
            orders_processed: self.orders_processed.load(Ordering::Relaxed),
            orders_delivered: self.orders_delivered.load(Ordering::Relaxed),
            revenue_cents: self.revenue_cents.load(Ordering::Relaxed),
            popular_items,
            started_at: self.started_at,
        }
    }
}
