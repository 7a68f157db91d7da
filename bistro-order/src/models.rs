use std::fmt;
use std::sync::Arc;

use bistro_core::{DispatchError, DispatchResult, OrderIdGenerator, StatusNotifier};
use bistro_shared::{CustomerId, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Orders are shared between the queue and whichever worker holds them.
pub type SharedOrder = Arc<OrderRecord>;

/// Reference to a menu entry. The catalog itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MenuItemRef {
    pub id: u64,
    pub name: String,
}

impl MenuItemRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One line of an order, priced at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub item: MenuItemRef,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn new(item: MenuItemRef, quantity: u32, unit_price_cents: i64) -> Self {
        Self {
            item,
            quantity,
            unit_price_cents,
        }
    }

    /// `None` when the line does not fit in an `i64` of cents.
    pub fn checked_subtotal_cents(&self) -> Option<i64> {
        self.unit_price_cents.checked_mul(i64::from(self.quantity))
    }

    /// Saturates instead of overflowing. Lines inside an `OrderRecord` always
    /// fit, since construction rejects the ones that don't.
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents.saturating_mul(i64::from(self.quantity))
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} = {}",
            self.quantity,
            self.item.name,
            format_cents(self.subtotal_cents())
        )
    }
}

/// A finalized order: line items and total are fixed at construction, only
/// the status moves.
#[derive(Debug)]
pub struct OrderRecord {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<LineItem>,
    total_cents: i64,
    item_count: u64,
    created_at: DateTime<Utc>,
    status: Mutex<OrderStatus>,
    special_requests: Mutex<Vec<String>>,
}

impl OrderRecord {
    pub fn new(
        id: OrderId,
        customer_id: impl Into<CustomerId>,
        items: Vec<LineItem>,
        created_at: DateTime<Utc>,
    ) -> DispatchResult<Self> {
        let customer_id = customer_id.into();
        let totals = validate(&customer_id, &items)?;

        Ok(Self {
            id,
            customer_id,
            items,
            total_cents: totals.total_cents,
            item_count: totals.item_count,
            created_at,
            status: Mutex::new(OrderStatus::Placed),
            special_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        *self.status.lock()
    }

    /// Total quantity across all line items.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    pub fn special_requests(&self) -> Vec<String> {
        self.special_requests.lock().clone()
    }

    /// Moves the order one step forward and notifies exactly once.
    ///
    /// The status lock is held across the check and the write, so two callers
    /// racing on the same order cannot both succeed.
    pub fn advance(
        &self,
        target: OrderStatus,
        operation: &str,
        notifier: &dyn StatusNotifier,
    ) -> DispatchResult<()> {
        {
            let mut status = self.status.lock();
            if !status.can_transition_to(target) {
                return Err(DispatchError::invalid_transition(self.id, *status, operation));
            }
            *status = target;
        }

        tracing::debug!(order_id = self.id, status = %target, "Order status changed");
        notifier.notify(self.id, target);
        Ok(())
    }

    /// Cancels the order unless it has already left the kitchen.
    ///
    /// A cancelled order ends in `Delivered`; there is no separate cancelled
    /// state. No status notification is sent.
    pub fn cancel(&self) -> DispatchResult<()> {
        self.cancel_when(|status| {
            !matches!(status, OrderStatus::OutForDelivery | OrderStatus::Delivered)
        })
    }

    /// Cancels the order only if preparation has not started.
    pub fn cancel_unstarted(&self) -> DispatchResult<()> {
        self.cancel_when(|status| status == OrderStatus::Placed)
    }

    fn cancel_when(&self, allowed: impl Fn(OrderStatus) -> bool) -> DispatchResult<()> {
        let mut status = self.status.lock();
        if !allowed(*status) {
            return Err(DispatchError::invalid_transition(self.id, *status, "cancel"));
        }
        *status = OrderStatus::Delivered;
        tracing::info!(order_id = self.id, "Order cancelled");
        Ok(())
    }

    /// Attaches a note for the kitchen. Only accepted before preparation starts.
    pub fn add_special_request(&self, request: impl Into<String>) -> DispatchResult<()> {
        let status = self.status.lock();
        if *status != OrderStatus::Placed {
            return Err(DispatchError::invalid_transition(
                self.id,
                *status,
                "add special request",
            ));
        }
        let request = request.into();
        tracing::debug!(order_id = self.id, %request, "Special request added");
        self.special_requests.lock().push(request);
        Ok(())
    }
}

impl fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Order #{} for {}", self.id, self.customer_id)?;
        for item in &self.items {
            writeln!(f, " - {}", item)?;
        }
        writeln!(f, "Total: {}", format_cents(self.total_cents))?;
        writeln!(f, "Status: {}", self.status())?;
        write!(f, "Created: {}", self.created_at.format("%Y-%m-%d %H:%M:%S"))
    }
}

struct Totals {
    total_cents: i64,
    item_count: u64,
}

fn validate(customer_id: &str, items: &[LineItem]) -> DispatchResult<Totals> {
    if customer_id.trim().is_empty() {
        return Err(DispatchError::InvalidArgument(
            "Customer reference cannot be empty".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(DispatchError::InvalidArgument(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut totals = Totals {
        total_cents: 0,
        item_count: 0,
    };
    for line in items {
        totals.total_cents = line
            .checked_subtotal_cents()
            .and_then(|subtotal| totals.total_cents.checked_add(subtotal))
            .ok_or_else(|| {
                DispatchError::InvalidArgument(format!(
                    "Order total overflows at line '{}' ({} x {} cents)",
                    line.item.name, line.quantity, line.unit_price_cents
                ))
            })?;
        totals.item_count += u64::from(line.quantity);
    }
    Ok(totals)
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Builds orders with ids from an injected generator.
pub struct OrderFactory {
    ids: Arc<OrderIdGenerator>,
}

impl OrderFactory {
    pub fn new(ids: Arc<OrderIdGenerator>) -> Self {
        Self { ids }
    }

    /// Validates before drawing an id, so rejected orders leave no gaps.
    pub fn create(
        &self,
        customer_id: impl Into<CustomerId>,
        items: Vec<LineItem>,
    ) -> DispatchResult<SharedOrder> {
        let customer_id = customer_id.into();
        validate(&customer_id, &items)?;
        let order = OrderRecord::new(self.ids.next_id(), customer_id, items, Utc::now())?;
        Ok(Arc::new(order))
    }
}

impl Default for OrderFactory {
    fn default() -> Self {
        Self::new(Arc::new(OrderIdGenerator::new()))
    }
}
